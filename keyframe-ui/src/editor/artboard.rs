//! The artboard: a fixed-size drawing surface with undo/redo history and
//! pose import.
//!
//! The host binds pointer down/move/up to [`Artboard::begin_stroke`],
//! [`Artboard::extend_stroke`] and [`Artboard::end_stroke`], wires its
//! buttons to undo/redo/clear, and either awaits
//! [`Artboard::request_pose_from_prompt`] or drives the ticket API
//! ([`Artboard::begin_pose_request`] / [`Artboard::complete_pose_request`])
//! when it needs to keep handling input while a model is working.
//!
//! Rules the artboard keeps:
//! - The visible canvas always equals the history entry under the cursor,
//!   except while a stroke is being drawn.
//! - Failed imports and failed pose requests leave canvas and history as
//!   they were.
//! - A pose that arrives after `clear()` is dropped.

use egui::{Color32, ColorImage, Pos2};
use keyframe_ai::{GenerationError, PoseRequestV1, PoseSource};
use keyframe_core::{CodecError, Dimensions, EncodedImage};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::brush::{BrushSettings, BrushSize, Stroke};
use super::canvas::Placement;
use super::history::History;
use crate::config::ArtboardConfig;
use crate::Canvas;

/// Which kind of input the host is currently collecting. Only drawing is
/// gated on it; stored data is the same in every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Draw,
    Upload,
    Prompt,
}

/// Handle for an in-flight pose request.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseTicket {
    id: u64,
    generation: u64,
    request: PoseRequestV1,
}

impl PoseTicket {
    pub fn request(&self) -> &PoseRequestV1 {
        &self.request
    }
}

/// What happened to a completed pose request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseOutcome {
    /// The pose was drawn onto the canvas and recorded in history.
    Applied(Placement),
    /// The canvas was cleared (or another request took over) while the
    /// model was working; nothing changed.
    Discarded,
}

#[derive(Debug, Error)]
pub enum ArtboardError {
    #[error("could not decode image")]
    Decode(#[source] CodecError),

    #[error("could not encode canvas")]
    Encode(#[source] CodecError),

    #[error("pose generation failed")]
    Generation(#[from] GenerationError),

    #[error("pose prompt is empty")]
    EmptyPrompt,

    #[error("a pose request is already in flight")]
    RequestPending,
}

#[derive(Debug)]
pub struct Artboard {
    canvas: Canvas,
    history: History,
    brush: BrushSettings,
    mode: InteractionMode,
    stroke: Option<Stroke>,
    // Bumped on every clear; tickets from an older generation are stale.
    generation: u64,
    next_request_id: u64,
    pending_request: Option<u64>,
}

impl Artboard {
    /// A blank white artboard. Zero dimensions are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            warn!(width, height, "artboard dimensions must be positive, clamping to 1");
        }
        let canvas = Canvas::new(width.max(1), height.max(1), Color32::WHITE);
        let history = History::new(canvas.clone());
        info!(size = %canvas.dimensions(), "artboard ready");

        Self {
            canvas,
            history,
            brush: BrushSettings::default(),
            mode: InteractionMode::default(),
            stroke: None,
            generation: 0,
            next_request_id: 0,
            pending_request: None,
        }
    }

    pub fn from_config(config: &ArtboardConfig) -> Self {
        let mut board = Self::new(config.width, config.height);
        board.history = board.history.with_limit(config.history_limit);
        let [r, g, b] = config.brush_color;
        board.brush = BrushSettings {
            color: Color32::from_rgb(r, g, b),
            width: config.brush_size.width(),
            smoothing: config.smoothing,
        };
        board
    }

    /// Wipe to white and start history over. Any stroke in progress is
    /// dropped and any pending pose request becomes stale.
    pub fn clear(&mut self) {
        info!(generation = self.generation + 1, "clearing artboard");
        self.stroke = None;
        self.canvas.clear();
        self.history.reset(self.canvas.clone());
        self.generation += 1;
        self.pending_request = None;
    }

    // ---- brush & mode -------------------------------------------------

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn set_brush_color(&mut self, color: Color32) {
        self.brush.color = color;
    }

    pub fn set_brush_size(&mut self, size: BrushSize) {
        self.brush.width = size.width();
    }

    /// Free-form width in pixels; non-positive widths are ignored.
    pub fn set_brush_width(&mut self, width: f32) {
        if width > 0.0 && width.is_finite() {
            self.brush.width = width;
        } else {
            warn!(width, "ignoring invalid brush width");
        }
    }

    pub fn set_smoothing(&mut self, smoothing: bool) {
        self.brush.smoothing = smoothing;
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switch input mode. A stroke still in progress is finished first.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode != self.mode {
            self.end_stroke();
            debug!(from = ?self.mode, to = ?mode, "mode change");
            self.mode = mode;
        }
    }

    // ---- strokes ------------------------------------------------------

    /// Start a stroke at `at`. Ignored outside draw mode or while another
    /// stroke is active.
    pub fn begin_stroke(&mut self, at: Pos2) -> bool {
        if self.mode != InteractionMode::Draw {
            debug!(mode = ?self.mode, "stroke ignored outside draw mode");
            return false;
        }
        if self.stroke.is_some() {
            return false;
        }
        self.stroke = Some(Stroke::begin(self.brush, to_point(at)));
        true
    }

    /// Draw from the last pen position toward `to`. No-op without an
    /// active stroke.
    pub fn extend_stroke(&mut self, to: Pos2) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        stroke.extend(&mut self.canvas, to_point(to));
        true
    }

    /// Finish the active stroke and commit the canvas to history.
    pub fn end_stroke(&mut self) -> bool {
        let Some(stroke) = self.stroke.take() else {
            return false;
        };
        debug!(segments = stroke.segments(), "committing stroke");
        self.history.push(self.canvas.clone());
        true
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    // ---- images -------------------------------------------------------

    /// Replace the canvas with `image`, letterboxed and centered, and record
    /// it in history. Undecodable input leaves everything untouched.
    pub fn import_image(&mut self, image: &EncodedImage) -> Result<Placement, ArtboardError> {
        let decoded = image.decode().map_err(|e| {
            warn!(error = %e, "image import failed");
            ArtboardError::Decode(e)
        })?;

        // A drag still in progress keeps what was drawn so far.
        self.end_stroke();
        let placement = self.canvas.paste_letterboxed(&decoded);
        self.history.push(self.canvas.clone());
        Ok(placement)
    }

    /// The canvas as PNG.
    pub fn export_image(&self) -> Result<EncodedImage, ArtboardError> {
        EncodedImage::encode_png(&self.canvas.to_rgba_image()).map_err(ArtboardError::Encode)
    }

    /// The canvas as an egui texture source.
    pub fn to_color_image(&self) -> ColorImage {
        self.canvas.to_color_image()
    }

    // ---- pose requests ------------------------------------------------

    /// Reserve the single pose-request slot for `text`.
    pub fn begin_pose_request(&mut self, text: &str) -> Result<PoseTicket, ArtboardError> {
        let request = PoseRequestV1::new(text, self.canvas.dimensions()).map_err(|e| match e {
            GenerationError::EmptyPrompt => ArtboardError::EmptyPrompt,
            other => ArtboardError::Generation(other),
        })?;
        if self.pending_request.is_some() {
            warn!("pose request refused: another is in flight");
            return Err(ArtboardError::RequestPending);
        }

        let id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_request = Some(id);
        info!(id, generation = self.generation, prompt = %request.prompt, "pose requested");

        Ok(PoseTicket {
            id,
            generation: self.generation,
            request,
        })
    }

    /// Hand back the model's answer for `ticket`.
    ///
    /// Stale tickets (the board was cleared since they were issued) are
    /// discarded whatever the result. Otherwise a failure is returned as is
    /// and a success is imported like [`Artboard::import_image`].
    pub fn complete_pose_request(
        &mut self,
        ticket: PoseTicket,
        result: Result<EncodedImage, GenerationError>,
    ) -> Result<PoseOutcome, ArtboardError> {
        if ticket.generation != self.generation || self.pending_request != Some(ticket.id) {
            warn!(
                id = ticket.id,
                issued_at = ticket.generation,
                current = self.generation,
                "discarding stale pose result"
            );
            return Ok(PoseOutcome::Discarded);
        }
        self.pending_request = None;

        let image = result.map_err(|e| {
            warn!(id = ticket.id, error = %e, "pose generation failed");
            ArtboardError::Generation(e)
        })?;
        let placement = self.import_image(&image)?;
        info!(id = ticket.id, "pose applied");
        Ok(PoseOutcome::Applied(placement))
    }

    /// Ask `source` for a pose and load it. Holds the artboard for the whole
    /// round trip; use the ticket API to interleave other input.
    pub async fn request_pose_from_prompt<S: PoseSource>(
        &mut self,
        source: &S,
        text: &str,
    ) -> Result<PoseOutcome, ArtboardError> {
        let ticket = self.begin_pose_request(text)?;
        let result = source.generate_pose(ticket.request()).await;
        self.complete_pose_request(ticket, result)
    }

    pub fn is_request_pending(&self) -> bool {
        self.pending_request.is_some()
    }

    // ---- history ------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.abandon_stroke();
        match self.history.undo() {
            Some(state) => {
                self.canvas.clone_from(state);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.abandon_stroke();
        match self.history.redo() {
            Some(state) => {
                self.canvas.clone_from(state);
                true
            }
            None => false,
        }
    }

    // Drop a half-drawn stroke and put the committed state back on screen.
    fn abandon_stroke(&mut self) {
        if self.stroke.take().is_some() {
            debug!("abandoning stroke in progress");
            self.canvas.clone_from(self.history.current());
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn cursor(&self) -> usize {
        self.history.current_index()
    }

    // ---- surface ------------------------------------------------------

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn dimensions(&self) -> Dimensions {
        self.canvas.dimensions()
    }
}

impl Default for Artboard {
    fn default() -> Self {
        Self::from_config(&ArtboardConfig::default())
    }
}

fn to_point(p: Pos2) -> Point {
    Point::new(f64::from(p.x), f64::from(p.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn stroke_outside_draw_mode_is_ignored() {
        let mut board = Artboard::new(32, 32);
        board.set_mode(InteractionMode::Upload);

        assert!(!board.begin_stroke(pos2(4.0, 4.0)));
        assert!(!board.extend_stroke(pos2(20.0, 20.0)));
        assert!(!board.end_stroke());
        assert_eq!(board.history_len(), 1);
    }

    #[test]
    fn extend_and_end_without_begin_are_noops() {
        let mut board = Artboard::new(32, 32);
        assert!(!board.extend_stroke(pos2(5.0, 5.0)));
        assert!(!board.end_stroke());
        assert_eq!(board.history_len(), 1);
        assert!(board.canvas().pixels.iter().all(|p| *p == Color32::WHITE));
    }

    #[test]
    fn second_begin_while_drawing_is_ignored() {
        let mut board = Artboard::new(32, 32);
        assert!(board.begin_stroke(pos2(1.0, 1.0)));
        assert!(!board.begin_stroke(pos2(9.0, 9.0)));
        assert!(board.is_drawing());
    }

    #[test]
    fn brush_change_mid_stroke_applies_to_next_stroke() {
        let mut board = Artboard::new(40, 40);
        board.set_smoothing(false);
        board.set_brush_color(Color32::BLACK);
        board.begin_stroke(pos2(2.0, 10.0));
        board.set_brush_color(Color32::RED);
        board.extend_stroke(pos2(38.0, 10.0));
        board.end_stroke();

        assert_eq!(board.canvas().get_pixel(20, 10), Some(Color32::BLACK));
    }

    #[test]
    fn leaving_draw_mode_commits_open_stroke() {
        let mut board = Artboard::new(32, 32);
        board.begin_stroke(pos2(2.0, 2.0));
        board.extend_stroke(pos2(30.0, 30.0));
        board.set_mode(InteractionMode::Prompt);

        assert!(!board.is_drawing());
        assert_eq!(board.history_len(), 2);
    }

    #[test]
    fn undo_mid_stroke_drops_the_stroke() {
        let mut board = Artboard::new(32, 32);
        board.set_smoothing(false);
        board.begin_stroke(pos2(2.0, 2.0));
        board.extend_stroke(pos2(30.0, 30.0));
        assert!(!board.undo());

        assert!(!board.is_drawing());
        assert!(!board.end_stroke());
        assert_eq!(board.history_len(), 1);
        assert!(board.canvas().pixels.iter().all(|p| *p == Color32::WHITE));
    }

    #[test]
    fn invalid_widths_are_ignored() {
        let mut board = Artboard::new(8, 8);
        board.set_brush_size(BrushSize::Large);
        board.set_brush_width(0.0);
        board.set_brush_width(f32::NAN);
        assert_eq!(board.brush().width, BrushSize::Large.width());
        board.set_brush_width(5.5);
        assert_eq!(board.brush().width, 5.5);
    }

    #[test]
    fn zero_size_is_clamped() {
        let board = Artboard::new(0, 10);
        assert_eq!(board.dimensions(), Dimensions::new(1, 10));
    }

    #[test]
    fn empty_prompt_is_rejected_without_reserving_slot() {
        let mut board = Artboard::new(8, 8);
        assert!(matches!(
            board.begin_pose_request("   "),
            Err(ArtboardError::EmptyPrompt)
        ));
        assert!(!board.is_request_pending());
    }

    #[test]
    fn error_messages_do_not_repeat_their_source() {
        let err = ArtboardError::Generation(GenerationError::EmptyResponse);
        assert_eq!(err.to_string(), "pose generation failed");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "model returned no image");
    }

    #[test]
    fn only_one_request_in_flight() {
        let mut board = Artboard::new(8, 8);
        let _ticket = board.begin_pose_request("wave").unwrap();
        assert!(matches!(
            board.begin_pose_request("jump"),
            Err(ArtboardError::RequestPending)
        ));
    }
}
