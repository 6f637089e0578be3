//! Version information.

/// Crate version from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable version line.
pub fn full_version() -> String {
    format!("cadence {}", VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_line_contains_crate_version() {
        assert!(full_version().contains(VERSION));
    }
}
