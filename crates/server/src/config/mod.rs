mod content;
mod logging;
mod server;
mod stream;


pub use content::*;
pub use logging::*;
pub use server::*;
pub use stream::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Ephemera server, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EphemeraConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Content lifetime and acceptance limits.
    #[serde(default)]
    pub content: ContentConfig,
    /// Live event stream settings.
    #[serde(default)]
    pub stream: StreamConfig,
    /// Browser UI configuration.
    #[serde(default)]
    pub ui: UiConfig,
    /// Log filter and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EphemeraConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist. The result is validated.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        let content = &self.content;
        if content.ttl_seconds == 0 || content.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ServerError::Config(format!(
                "content.ttl_seconds must be between 1 and {MAX_TTL_SECONDS}"
            )));
        }
        if content.sweep_interval_seconds == 0 {
            return Err(ServerError::Config(
                "content.sweep_interval_seconds must be positive".into(),
            ));
        }
        if content.max_text_length == 0 {
            return Err(ServerError::Config(
                "content.max_text_length must be positive".into(),
            ));
        }
        if content.allowed_mime_types.is_empty() {
            return Err(ServerError::Config(
                "content.allowed_mime_types must not be empty".into(),
            ));
        }
        if self.stream.max_observers == 0 {
            return Err(ServerError::Config(
                "stream.max_observers must be positive".into(),
            ));
        }
        // Room for at least the snapshot and the first client count.
        if self.stream.observer_buffer < 2 {
            return Err(ServerError::Config(
                "stream.observer_buffer must be at least 2".into(),
            ));
        }
        if self.stream.keep_alive_seconds == 0 {
            return Err(ServerError::Config(
                "stream.keep_alive_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}
