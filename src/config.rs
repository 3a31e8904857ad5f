//! Construction-time configuration, in the style of the teacher's
//! `robt::Config` (doc-per-field, `Default` plus a small builder).

/// Configuration for a [`crate::Database`]. Only `patternize` has any
/// effect today (spec.md §4.A "Disable switch"); it is captured here,
/// rather than as a bare bool parameter, so construction reads the same
/// way the teacher's index configs do and so later options have a home.
#[derive(Clone, Debug)]
pub struct Config {
    /// Run string values through the CLP-style pattern extractor before
    /// storing them.
    ///
    /// Default: `true`. When `false`, `insert` stores each string value
    /// verbatim and emits no variable columns (spec.md §4.A).
    pub patternize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { patternize: true }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn patternize(mut self, on: bool) -> Config {
        self.patternize = on;
        self
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn default_patternizes() {
        assert!(Config::default().patternize);
    }

    #[test]
    fn builder_disables_patternize() {
        let cfg = Config::new().patternize(false);
        assert!(!cfg.patternize);
    }
}
