//! Artboard configuration, loaded from JSON.
//!
//! Every field has a default so a config file only needs the keys it changes.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::BrushSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtboardConfig {
    pub width: u32,
    pub height: u32,
    /// Max snapshots kept for undo, baseline included. `None` keeps all.
    pub history_limit: Option<usize>,
    pub brush_size: BrushSize,
    pub brush_color: [u8; 3],
    pub smoothing: bool,
}

impl Default for ArtboardConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            history_limit: None,
            brush_size: BrushSize::Medium,
            brush_color: [0, 0, 0],
            smoothing: true,
        }
    }
}

impl ArtboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(limit) = self.history_limit {
            if limit < 2 {
                return Err(ConfigError::HistoryLimitTooSmall { limit });
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parse artboard config json")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read artboard config: {}", path.display()))?;
        let config = Self::from_json_str(&data)
            .with_context(|| format!("load artboard config: {}", path.display()))?;
        tracing::info!(path = %path.display(), width = config.width, height = config.height, "config loaded");
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("artboard size must be positive, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("history limit {limit} leaves no room to undo (minimum 2)")]
    HistoryLimitTooSmall { limit: usize },
}
