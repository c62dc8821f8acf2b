//! Configuration
//!
//! Read once at startup from an optional JSON file; every field has a default.

mod schema;

pub use schema::*;

use std::path::Path;
use tracing::{debug, info};

use crate::error::{AppError, Result};

impl AppConfig {
    /// Load configuration from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration if a path is given, defaults otherwise
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => {
                debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.events.channel_capacity == 0 {
            return Err(AppError::Config(
                "events.channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.hid.sdp.name.trim().is_empty() {
            return Err(AppError::Config("hid.sdp.name must not be empty".to_string()));
        }
        Ok(())
    }
}
