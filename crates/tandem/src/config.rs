//! # TANDEM Configuration
//!
//! One TOML file with a table per layer:
//!
//! ```toml
//! frames = 600
//!
//! [handoff]
//! bind_failure_policy = "abort_cycle"
//!
//! [platform]
//! mode = 4
//! backend = "native"
//!
//! [simulation]
//! bind_failure_every = 97
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tandem_core::{ConfigError, HandoffConfig};
use tandem_gl::{Desktop, PlatformConfig};

/// Settings for the simulated desktop and context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fail every n-th context bind. `None` never fails.
    pub bind_failure_every: Option<u64>,
    /// Desktop width in pixels.
    pub desktop_width: u32,
    /// Desktop height in pixels.
    pub desktop_height: u32,
    /// Desktop bits per pixel.
    pub desktop_color_bits: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bind_failure_every: None,
            desktop_width: 1920,
            desktop_height: 1080,
            desktop_color_bits: 32,
        }
    }
}

impl SimulationConfig {
    /// The simulated desktop.
    #[must_use]
    pub fn desktop(&self) -> Desktop {
        Desktop {
            width: self.desktop_width,
            height: self.desktop_height,
            color_bits: self.desktop_color_bits,
        }
    }
}

/// Whole-program configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TandemConfig {
    /// Frames to run before shutting down.
    pub frames: u64,
    /// Handoff settings.
    pub handoff: HandoffConfig,
    /// Platform settings.
    pub platform: PlatformConfig,
    /// Simulation settings.
    pub simulation: SimulationConfig,
}

impl Default for TandemConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            handoff: HandoffConfig::default(),
            platform: PlatformConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl TandemConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values in any table.
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
    /// [`TandemConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every table.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.handoff.validate()?;
        self.platform.validate()?;
        let sim = &self.simulation;
        if sim.desktop_width == 0 || sim.desktop_height == 0 {
            return Err(ConfigError::Invalid("simulated desktop needs a non-zero size".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::BindFailurePolicy;
    use tandem_gl::BackendKind;

    #[test]
    fn test_empty_document_is_default() {
        let config = TandemConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, TandemConfig::default());
    }

    #[test]
    fn test_nested_tables() {
        let config = TandemConfig::from_toml_str(
            r#"
            frames = 10

            [handoff]
            bind_failure_policy = "continue"

            [platform]
            backend = "null"
            log_frames = 2

            [simulation]
            bind_failure_every = 7
            desktop_width = 1280
            desktop_height = 720
            "#,
        )
        .expect("valid config");

        assert_eq!(config.frames, 10);
        assert_eq!(config.handoff.bind_failure_policy, BindFailurePolicy::Continue);
        assert_eq!(config.platform.backend, BackendKind::Null);
        assert_eq!(config.platform.log_frames, 2);
        assert_eq!(config.simulation.bind_failure_every, Some(7));
        assert_eq!(config.simulation.desktop().width, 1280);
    }

    #[test]
    fn test_invalid_nested_value_rejected() {
        let err = TandemConfig::from_toml_str("[handoff]\nthread_name = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = TandemConfig::from_toml_str("[platform]\nmode = 40").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
