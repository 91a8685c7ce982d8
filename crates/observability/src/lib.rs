//! Process-wide logging setup shared by the storefront binaries.

/// Install the JSON log subscriber.
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filters, formatting).
pub mod tracing;
