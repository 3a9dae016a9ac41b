//! Capacities and limits for compilation and execution
//!
//! Every field has a default matching the classic fixed-size tables, so an
//! empty TOML file (or no file at all) gives the standard machine.
//!
//! ```toml
//! memory_size = 256
//! max_steps = 100000
//! ```

use crate::compiler::CompilerError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Total cells in the memory image, registers included
    pub memory_size: usize,
    pub max_symbols: usize,
    pub max_labels: usize,
    pub max_instructions: usize,
    /// Depth of the IF/ELSE resolution stack
    pub max_nesting: usize,
    /// Abort execution after this many steps (no limit when absent)
    pub max_steps: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory_size: 100,
            max_symbols: 25,
            max_labels: 50,
            max_instructions: 50,
            max_nesting: 100,
            max_steps: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, CompilerError> {
        toml::from_str(text).map_err(|e| CompilerError::ConfigError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CompilerError::IOError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.memory_size, 100);
        assert_eq!(config.max_symbols, 25);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str("memory_size = 512\nmax_steps = 1000\n").unwrap();
        assert_eq!(config.memory_size, 512);
        assert_eq!(config.max_steps, Some(1000));
        assert_eq!(config.max_labels, 50);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("stack = 3").unwrap_err();
        assert!(matches!(err, CompilerError::ConfigError(_)));
    }
}
