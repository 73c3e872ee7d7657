//! Builder configuration.
//!
//! [`BuilderConfig`] holds the few knobs the build recognizes: whether deprecated functions are
//! dropped, where headers live for computing include paths, and the limits that keep scope
//! searches and template substitution bounded on malformed input.
//!
//! Three presets cover the common setups:
//!
//! - [`BuilderConfig::default`] keeps deprecated functions and synthesizes implicit constructors
//! - [`BuilderConfig::strict`] drops deprecated functions
//! - [`BuilderConfig::minimal`] additionally skips implicit constructor synthesis
//!
//! ```rust
//! use cppmeta::BuilderConfig;
//!
//! let config = BuilderConfig::strict().with_header_paths(vec!["/usr/include/qt".into()]);
//! assert!(config.skip_deprecated);
//! assert_eq!(config.header_paths.len(), 1);
//! ```

use std::path::PathBuf;

/// Settings for one [`crate::MetaBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Drop functions declared deprecated
    pub skip_deprecated: bool,
    /// Include directories; the longest matching one is stripped from header paths
    pub header_paths: Vec<PathBuf>,
    /// The umbrella header; entities declared in it get no include
    pub global_header: Option<PathBuf>,
    /// Maximum number of enclosing scopes searched while resolving a name
    pub max_scope_depth: usize,
    /// Maximum nesting depth of template arguments and substitutions
    pub max_template_depth: usize,
    /// Synthesize default and copy constructors where C++ would
    pub add_default_constructors: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            skip_deprecated: false,
            header_paths: Vec::new(),
            global_header: None,
            max_scope_depth: 64,
            max_template_depth: 100,
            add_default_constructors: true,
        }
    }
}

impl BuilderConfig {
    /// Drops deprecated functions, otherwise the defaults.
    #[must_use]
    pub fn strict() -> Self {
        BuilderConfig {
            skip_deprecated: true,
            ..BuilderConfig::default()
        }
    }

    /// Only what is declared: deprecated functions are dropped and no constructors are
    /// synthesized.
    #[must_use]
    pub fn minimal() -> Self {
        BuilderConfig {
            skip_deprecated: true,
            add_default_constructors: false,
            ..BuilderConfig::default()
        }
    }

    /// Set the include directories.
    #[must_use]
    pub fn with_header_paths(mut self, header_paths: Vec<PathBuf>) -> Self {
        self.header_paths = header_paths;
        self
    }

    /// Set the umbrella header.
    #[must_use]
    pub fn with_global_header(mut self, global_header: impl Into<PathBuf>) -> Self {
        self.global_header = Some(global_header.into());
        self
    }

    /// Choose whether deprecated functions are dropped.
    #[must_use]
    pub fn with_skip_deprecated(mut self, skip_deprecated: bool) -> Self {
        self.skip_deprecated = skip_deprecated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = BuilderConfig::default();
        assert!(!default.skip_deprecated);
        assert!(default.add_default_constructors);
        assert_eq!(default.max_scope_depth, 64);
        assert_eq!(default.max_template_depth, 100);

        assert!(BuilderConfig::strict().skip_deprecated);
        assert!(BuilderConfig::strict().add_default_constructors);
        assert!(!BuilderConfig::minimal().add_default_constructors);
    }

    #[test]
    fn test_setters() {
        let config = BuilderConfig::default()
            .with_global_header("/src/global.h")
            .with_skip_deprecated(true);
        assert_eq!(config.global_header, Some(PathBuf::from("/src/global.h")));
        assert!(config.skip_deprecated);
    }
}
