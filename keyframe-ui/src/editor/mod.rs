// Editor module for Keyframe UI.

pub mod artboard;
pub mod brush;
pub mod canvas;
pub mod history;

pub use artboard::{Artboard, ArtboardError, InteractionMode, PoseOutcome, PoseTicket};
pub use brush::{BrushSettings, BrushSize, Stroke, PALETTE};
pub use canvas::{letterbox, Canvas, Placement};
pub use history::History;
