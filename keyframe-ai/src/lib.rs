// This defines what we send to the image model when asking for a pose
// and the seam the artboard awaits on while the model works.
// The actual network client lives in the host; we only describe the contract.

//import
use std::future::Future;

use keyframe_core::{Dimensions, EncodedImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Something that can turn a pose description into a picture.
///
/// Implementations own their own timeout/retry policy. The artboard awaits
/// exactly one call at a time and never cancels it.
pub trait PoseSource {
    fn generate_pose(
        &self,
        request: &PoseRequestV1,
    ) -> impl Future<Output = Result<EncodedImage, GenerationError>>;
}

/// Look of the generated pose frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseStyle {
    /// Simple black-on-white line figure, the same look as a hand drawing.
    #[default]
    Sketch,
    /// Mannequin-style silhouette.
    Silhouette,
}

impl PoseStyle {
    fn describe(self) -> &'static str {
        match self {
            PoseStyle::Sketch => "a simple black line drawing of a stick figure",
            PoseStyle::Silhouette => "a flat grey mannequin silhouette",
        }
    }
}

/// Payload for one pose generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseRequestV1 {
    /// What the user typed, trimmed.
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub style: PoseStyle,
}

impl PoseRequestV1 {
    pub fn new(prompt: &str, size: Dimensions) -> Result<Self, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        Ok(Self {
            prompt: prompt.to_string(),
            width: size.width,
            height: size.height,
            style: PoseStyle::default(),
        })
    }

    pub fn with_style(mut self, style: PoseStyle) -> Self {
        self.style = style;
        self
    }

    pub fn size(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Full instruction text for the image model.
    pub fn to_prompt_text(&self) -> String {
        format!(
            "Draw {} in this pose: {}. Full body, centered, on a plain white background. Output a {}x{} image.",
            self.style.describe(),
            self.prompt,
            self.width,
            self.height
        )
    }

    pub fn to_json(&self) -> Result<String, GenerationError> {
        serde_json::to_string(self).map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        let request: Self =
            serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        debug!(prompt = %request.prompt, "parsed pose request");
        Ok(request)
    }
}

/// Serves the same image for every request. Handy for offline runs and tests.
#[derive(Debug, Clone)]
pub struct FixedPoseSource {
    image: EncodedImage,
}

impl FixedPoseSource {
    pub fn new(image: EncodedImage) -> Self {
        Self { image }
    }
}

impl PoseSource for FixedPoseSource {
    async fn generate_pose(&self, request: &PoseRequestV1) -> Result<EncodedImage, GenerationError> {
        debug!(prompt = %request.prompt, bytes = self.image.len(), "serving fixed pose");
        if self.image.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(self.image.clone())
    }
}

/// Why a pose could not be produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("pose prompt is empty")]
    EmptyPrompt,

    #[error("request rejected by model: {reason}")]
    Rejected { reason: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("model returned no image")]
    EmptyResponse,

    #[error("malformed payload: {0}")]
    Malformed(String),
}
