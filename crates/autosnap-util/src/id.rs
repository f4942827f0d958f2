//! ULID-based identifiers.
//!
//! Version ids look like `ver_01hqxyz...`. ULIDs come from a process-wide
//! monotonic generator, so ids created within the same millisecond still
//! sort in creation order.

use once_cell::sync::Lazy;
use std::sync::Mutex;
use ulid::{Generator, Ulid};

static GENERATOR: Lazy<Mutex<Generator>> = Lazy::new(|| Mutex::new(Generator::new()));

const VERSION_PREFIX: &str = "ver";

/// Identifier generation.
pub struct Identifier;

impl Identifier {
    /// Generate a version id. Later calls compare greater.
    pub fn version() -> String {
        format!("{VERSION_PREFIX}_{}", next_ulid().to_string().to_lowercase())
    }
}

fn next_ulid() -> Ulid {
    // Overflow of the random part within one millisecond is the only
    // failure; a fresh ULID is still unique then.
    match GENERATOR.lock() {
        Ok(mut generator) => generator.generate().unwrap_or_else(|_| Ulid::new()),
        Err(_) => Ulid::new(),
    }
}
