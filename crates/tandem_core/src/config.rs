//! # Handoff Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! thread_name = "renderer"
//! stack_size = 4194304
//! bind_failure_policy = "abort_cycle"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default name given to the render thread.
pub const DEFAULT_THREAD_NAME: &str = "renderer";

/// Smallest stack accepted for the render thread.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// What the coordinator does when binding or unbinding the context fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindFailurePolicy {
    /// Log, count, and carry on as if the call had succeeded.
    Continue,
    /// Finish the rendezvous, then report the failure to the caller.
    ///
    /// For the renderer this means skipping the frame: the payload stays in
    /// the slot and the renderer goes back to sleep.
    #[default]
    AbortCycle,
}

/// Configuration for the handoff coordinator and its render thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// OS-visible name of the render thread.
    pub thread_name: String,
    /// Stack size for the render thread. `None` uses the platform default.
    pub stack_size: Option<usize>,
    /// Policy for failed context binds and unbinds.
    pub bind_failure_policy: BindFailurePolicy,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
            bind_failure_policy: BindFailurePolicy::default(),
        }
    }
}

impl HandoffConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`HandoffConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty thread name or a stack
    /// smaller than [`MIN_STACK_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid("thread_name must not be empty".into()));
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::Invalid("thread_name must not contain NUL".into()));
        }
        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "stack_size {size} is below the minimum of {MIN_STACK_SIZE}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandoffConfig::default();
        assert_eq!(config.thread_name, "renderer");
        assert_eq!(config.stack_size, None);
        assert_eq!(config.bind_failure_policy, BindFailurePolicy::AbortCycle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let config = HandoffConfig::from_toml_str(
            r#"
            thread_name = "smp"
            stack_size = 1048576
            bind_failure_policy = "continue"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.thread_name, "smp");
        assert_eq!(config.stack_size, Some(1_048_576));
        assert_eq!(config.bind_failure_policy, BindFailurePolicy::Continue);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = HandoffConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, HandoffConfig::default());
    }

    #[test]
    fn test_rejects_tiny_stack() {
        let err = HandoffConfig::from_toml_str("stack_size = 16").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = HandoffConfig::from_toml_str(r#"bind_failure_policy = "retry""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = HandoffConfig::from_file("/nonexistent/tandem/handoff.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("handoff.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
