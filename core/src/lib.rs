//! # Quasar Core
//!
//! Math aliases and small runtime utilities shared by every Quasar crate.

pub mod math;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the runtime banner. Call once after the logger is installed.
pub fn init() {
    log::info!("Quasar Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
