//! `autosnap settings`.

use autosnap_core::TrackingPolicy;
use autosnap_util::path;
use std::path::Path;

/// Print the active tracking policy.
pub async fn run_settings(root: &Path) -> anyhow::Result<()> {
    let policy = TrackingPolicy::load(root).await?;
    let config_path = path::config_path(root);

    println!("Configuration ({}):", config_path.display());
    println!("{}", policy.to_json_pretty()?);
    println!();
    if config_path.exists() {
        println!("Edit this file to change settings.");
    } else {
        println!("No config file yet; these are the defaults. Run `autosnap init` to create it.");
    }
    println!("Retention settings are informational and not enforced.");
    Ok(())
}
