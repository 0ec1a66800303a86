//! keyframe-ui: the drawing side of Keyframe.
//!
//! The [`Artboard`] is where a pose gets sketched, imported or generated
//! before it is handed on as an image. Everything here is headless; the host
//! window binds its pointer events and buttons to artboard operations and
//! shows [`Artboard::to_color_image`] as a texture.

pub mod config;
pub mod editor;

pub use config::{ArtboardConfig, ConfigError};
pub use editor::{
    Artboard, ArtboardError, BrushSettings, BrushSize, Canvas, History, InteractionMode,
    Placement, PoseOutcome, PoseTicket,
};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
