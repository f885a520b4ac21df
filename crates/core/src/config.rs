//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the panel, generator and
//! session sources. Nothing in this crate reads environment variables on its own; binaries read
//! them and hand the raw values to the parsing helpers below.

use crate::constants::{DEFAULT_EXPORT_DIR, DEFAULT_GENERATION_DELAY};
use crate::{StoryError, StoryResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    generation_delay: Duration,
    export_dir: PathBuf,
    sessions_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            generation_delay: DEFAULT_GENERATION_DELAY,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            sessions_dir: None,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `sessions_dir` selects the YAML session source; `None` selects the built-in mock sessions.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidInput`] if `export_dir` is empty.
    pub fn new(
        generation_delay: Duration,
        export_dir: PathBuf,
        sessions_dir: Option<PathBuf>,
    ) -> StoryResult<Self> {
        if export_dir.as_os_str().is_empty() {
            return Err(StoryError::InvalidInput(
                "export_dir cannot be empty".into(),
            ));
        }

        Ok(Self {
            generation_delay,
            export_dir,
            sessions_dir,
        })
    }

    pub fn generation_delay(&self) -> Duration {
        self.generation_delay
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn sessions_dir(&self) -> Option<&Path> {
        self.sessions_dir.as_deref()
    }

    /// Build the configuration from raw environment values.
    ///
    /// Each argument is the value of the matching variable (`TALES_GENERATION_DELAY_MS`,
    /// `TALES_EXPORT_DIR`, `TALES_SESSIONS_DIR`), or `None` when unset.
    pub fn from_env_values(
        generation_delay_ms: Option<String>,
        export_dir: Option<String>,
        sessions_dir: Option<String>,
    ) -> StoryResult<Self> {
        let generation_delay = generation_delay_from_env_value(generation_delay_ms)?;
        let export_dir = non_blank(export_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR));
        let sessions_dir = non_blank(sessions_dir).map(PathBuf::from);

        Self::new(generation_delay, export_dir, sessions_dir)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the simulated generation delay (in milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default delay.
pub fn generation_delay_from_env_value(value: Option<String>) -> StoryResult<Duration> {
    let Some(raw) = non_blank(value) else {
        return Ok(DEFAULT_GENERATION_DELAY);
    };

    let millis = raw.parse::<u64>().map_err(|e| {
        StoryError::InvalidInput(format!(
            "TALES_GENERATION_DELAY_MS must be a whole number of milliseconds, got '{raw}': {e}"
        ))
    })?;

    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = CoreConfig::from_env_values(None, None, None).expect("defaults are valid");
        assert_eq!(cfg.generation_delay(), Duration::from_secs(3));
        assert_eq!(cfg.export_dir(), Path::new("exports"));
        assert!(cfg.sessions_dir().is_none());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = CoreConfig::from_env_values(Some("  ".into()), Some("".into()), Some(" ".into()))
            .expect("blank values are treated as unset");
        assert_eq!(cfg.generation_delay(), DEFAULT_GENERATION_DELAY);
        assert!(cfg.sessions_dir().is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = CoreConfig::from_env_values(
            Some("250".into()),
            Some("/tmp/out".into()),
            Some("/srv/sessions".into()),
        )
        .expect("valid values");
        assert_eq!(cfg.generation_delay(), Duration::from_millis(250));
        assert_eq!(cfg.export_dir(), Path::new("/tmp/out"));
        assert_eq!(cfg.sessions_dir(), Some(Path::new("/srv/sessions")));
    }

    #[test]
    fn non_numeric_delay_is_rejected() {
        let err = generation_delay_from_env_value(Some("3s".into()))
            .expect_err("non-numeric delay should fail");
        assert!(matches!(err, StoryError::InvalidInput(_)));
    }

    #[test]
    fn empty_export_dir_is_rejected() {
        let err = CoreConfig::new(Duration::ZERO, PathBuf::new(), None)
            .expect_err("empty export dir should fail");
        assert!(matches!(err, StoryError::InvalidInput(_)));
    }
}
