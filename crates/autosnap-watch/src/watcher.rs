//! Filesystem watch loop.

use crate::debounce::Debouncer;
use crate::error::WatchResult;
use crate::scheduler::{Admission, Scheduler};
use autosnap_core::Workspace;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// A running watch.
///
/// Dropping the handle without calling [`WatchHandle::stop`] stops event
/// delivery but does not wait for in-flight processing.
pub struct WatchHandle {
    watcher: RecommendedWatcher,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop accepting events and wait for in-flight processing to finish.
    ///
    /// Changes still waiting for quiescence are discarded.
    pub async fn stop(self) {
        drop(self.watcher);
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Watch loop panicked");
        }
        info!("Watcher stopped");
    }
}

/// Open the project at `root` and start watching it.
pub async fn watch_root(root: PathBuf) -> WatchResult<WatchHandle> {
    let workspace = Workspace::open(root).await?;
    start_watch(&workspace)
}

/// Start watching an opened project.
pub fn start_watch(workspace: &Workspace) -> WatchResult<WatchHandle> {
    watch(Arc::new(Scheduler::for_workspace(workspace)))
}

/// Start watching with an explicit scheduler.
///
/// Must be called from within a tokio runtime.
pub fn watch(scheduler: Arc<Scheduler>) -> WatchResult<WatchHandle> {
    let (tx, rx) = mpsc::unbounded_channel();
    let root = scheduler.root().to_path_buf();

    let admitter = Arc::clone(&scheduler);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            handle_notify_event(res, &admitter, &tx);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(scheduler, rx, cancel.clone()));

    info!(root = %root.display(), "Watcher is active");
    Ok(WatchHandle {
        watcher,
        cancel,
        task,
    })
}

/// Filter raw notifications and forward accepted paths to the loop.
fn handle_notify_event(
    res: Result<Event, notify::Error>,
    scheduler: &Scheduler,
    tx: &mpsc::UnboundedSender<PathBuf>,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "File watcher error");
            return;
        }
    };

    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        trace!(kind = ?event.kind, "Ignoring event kind");
        return;
    }

    for file in &event.paths {
        match scheduler.admit(file) {
            Admission::Accept(relative) => {
                trace!(path = %relative.display(), "Change queued");
                if tx.send(relative).is_err() {
                    return;
                }
            }
            Admission::TooLarge => {
                debug!(path = %file.display(), "Skipping file over size limit");
            }
            Admission::Ignored => {}
        }
    }
}

/// Debounce accepted paths and process each once it settles.
///
/// Runs until cancelled or until the event channel closes, then waits for
/// in-flight processing.
pub(crate) async fn run(
    scheduler: Arc<Scheduler>,
    mut events: mpsc::UnboundedReceiver<PathBuf>,
    cancel: CancellationToken,
) {
    let mut debouncer = Debouncer::new(scheduler.policy().debounce_interval());
    let mut tasks = JoinSet::new();

    loop {
        let deadline = debouncer.next_deadline();

        tokio::select! {
            _ = cancel.cancelled() => break,

            event = events.recv() => match event {
                Some(relative) => debouncer.touch(relative, Instant::now()),
                None => break,
            },

            _ = sleep_until_deadline(deadline) => {
                for relative in debouncer.drain_due(Instant::now()) {
                    let Some(guard) = scheduler.try_begin(&relative) else {
                        debug!(path = %relative.display(), "Already processing, event dropped");
                        continue;
                    };
                    let scheduler = Arc::clone(&scheduler);
                    tasks.spawn(async move {
                        scheduler.process_claimed(guard).await;
                    });
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Processing task failed");
                }
            }
        }
    }

    if !debouncer.is_empty() {
        debug!(pending = debouncer.len(), "Discarding unsettled changes");
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Processing task failed");
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
