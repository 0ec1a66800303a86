//! Session model for Keyframe (v1).
//!
//! Sessions are the durable unit of work. They store:
//! - the character reference
//! - start/end pose frames and how each was produced
//! - background replacement choices per frame
//! - the motion description and video settings

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::SESSION_SCHEMA_VERSION;

/// File extension recommended for saved sessions.
pub const SESSION_FILE_EXT: &str = "keyframe.json";

/// Shortest and longest clip the video model accepts, in seconds.
const MIN_DURATION_S: u32 = 1;
const MAX_DURATION_S: u32 = 8;

/// Which end of the animation a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseSlot {
    Start,
    End,
}

/// How the pose sketch was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoseOrigin {
    Drawn,
    Uploaded,
    Prompted { text: String },
}

/// Background treatment of a rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    Original,
    Replaced { prompt: String },
}

/// The uploaded character illustration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRefV1 {
    pub source_path: String,
    pub description: Option<String>,
}

/// One pose frame: the sketch the user made and, once the image model has
/// run, the full rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrameV1 {
    pub origin: PoseOrigin,
    pub sketch_path: String,
    pub rendered_path: Option<String>,
    #[serde(default)]
    pub background: BackgroundMode,
}

impl PoseFrameV1 {
    pub fn new(origin: PoseOrigin, sketch_path: impl Into<String>) -> Self {
        Self {
            origin,
            sketch_path: sketch_path.into(),
            rendered_path: None,
            background: BackgroundMode::Original,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered_path.is_some()
    }

    fn prompt_text(&self) -> Option<&str> {
        match &self.origin {
            PoseOrigin::Prompted { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettingsV1 {
    pub aspect: AspectRatio,
    pub duration_s: u32,
}

impl Default for VideoSettingsV1 {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            duration_s: 5,
        }
    }
}

impl VideoSettingsV1 {
    pub fn is_valid(&self) -> bool {
        (MIN_DURATION_S..=MAX_DURATION_S).contains(&self.duration_s)
    }
}

/// Everything the video model needs, assembled from a complete session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequestV1 {
    pub session_id: Uuid,
    pub character_path: String,
    pub start_frame_path: String,
    pub end_frame_path: String,
    pub motion_prompt: String,
    pub aspect: AspectRatio,
    pub duration_s: u32,
}

/// v1 session object. Save/load this as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSessionV1 {
    pub session_id: Uuid,
    pub schema_version: String,

    pub character: CharacterRefV1,

    pub start_pose: Option<PoseFrameV1>,
    pub end_pose: Option<PoseFrameV1>,

    /// What the user typed; empty means "derive one".
    pub motion_prompt: String,

    pub video: VideoSettingsV1,

    pub notes: Option<String>,
}

impl AnimationSessionV1 {
    pub fn new(character: CharacterRefV1) -> Self {
        let session = Self {
            session_id: Uuid::new_v4(),
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            character,
            start_pose: None,
            end_pose: None,
            motion_prompt: String::new(),
            video: VideoSettingsV1::default(),
            notes: None,
        };
        info!(session_id = %session.session_id, "new animation session");
        session
    }

    pub fn pose(&self, slot: PoseSlot) -> Option<&PoseFrameV1> {
        match slot {
            PoseSlot::Start => self.start_pose.as_ref(),
            PoseSlot::End => self.end_pose.as_ref(),
        }
    }

    fn pose_mut(&mut self, slot: PoseSlot) -> Result<&mut PoseFrameV1, SessionError> {
        let frame = match slot {
            PoseSlot::Start => self.start_pose.as_mut(),
            PoseSlot::End => self.end_pose.as_mut(),
        };
        frame.ok_or(SessionError::MissingPose { slot })
    }

    /// Put a new sketch in `slot`, replacing whatever was there.
    pub fn set_pose(&mut self, slot: PoseSlot, frame: PoseFrameV1) {
        debug!(?slot, origin = ?frame.origin, "pose set");
        match slot {
            PoseSlot::Start => self.start_pose = Some(frame),
            PoseSlot::End => self.end_pose = Some(frame),
        }
    }

    /// Record where the rendered frame for `slot` was written.
    pub fn mark_rendered(
        &mut self,
        slot: PoseSlot,
        rendered_path: impl Into<String>,
    ) -> Result<(), SessionError> {
        let frame = self.pose_mut(slot)?;
        frame.rendered_path = Some(rendered_path.into());
        Ok(())
    }

    /// Change the background treatment for `slot`. A different mode makes the
    /// existing render stale, so it has to be produced again.
    pub fn set_background(
        &mut self,
        slot: PoseSlot,
        mode: BackgroundMode,
    ) -> Result<(), SessionError> {
        if let BackgroundMode::Replaced { prompt } = &mode {
            if prompt.trim().is_empty() {
                return Err(SessionError::EmptyBackgroundPrompt);
            }
        }
        let frame = self.pose_mut(slot)?;
        if frame.background != mode {
            debug!(?slot, "background changed, render invalidated");
            frame.background = mode;
            frame.rendered_path = None;
        }
        Ok(())
    }

    pub fn set_motion_prompt(&mut self, text: impl Into<String>) {
        self.motion_prompt = text.into().trim().to_string();
    }

    /// The user's motion description, or one built from the pose prompts.
    pub fn effective_motion_prompt(&self) -> String {
        if !self.motion_prompt.is_empty() {
            return self.motion_prompt.clone();
        }
        let start = self.start_pose.as_ref().and_then(PoseFrameV1::prompt_text);
        let end = self.end_pose.as_ref().and_then(PoseFrameV1::prompt_text);
        match (start, end) {
            (Some(start), Some(end)) => format!(
                "The character moves smoothly from \"{start}\" to \"{end}\" in one continuous motion."
            ),
            _ => "The character moves smoothly from the pose in the first frame to the pose in the last frame in one continuous motion.".to_string(),
        }
    }

    /// Assemble the video request, or say what is still missing.
    pub fn video_request(&self) -> Result<VideoRequestV1, SessionError> {
        if self.character.source_path.trim().is_empty() {
            return Err(SessionError::MissingCharacter);
        }
        if !self.video.is_valid() {
            return Err(SessionError::InvalidDuration {
                duration_s: self.video.duration_s,
            });
        }
        let start_frame_path = self.rendered_path(PoseSlot::Start)?;
        let end_frame_path = self.rendered_path(PoseSlot::End)?;

        Ok(VideoRequestV1 {
            session_id: self.session_id,
            character_path: self.character.source_path.clone(),
            start_frame_path,
            end_frame_path,
            motion_prompt: self.effective_motion_prompt(),
            aspect: self.video.aspect,
            duration_s: self.video.duration_s,
        })
    }

    fn rendered_path(&self, slot: PoseSlot) -> Result<String, SessionError> {
        let frame = self.pose(slot).ok_or(SessionError::MissingPose { slot })?;
        frame
            .rendered_path
            .clone()
            .ok_or(SessionError::PoseNotRendered { slot })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no character has been uploaded")]
    MissingCharacter,

    #[error("no {slot:?} pose has been set")]
    MissingPose { slot: PoseSlot },

    #[error("{slot:?} pose has not been rendered yet")]
    PoseNotRendered { slot: PoseSlot },

    #[error("background prompt is empty")]
    EmptyBackgroundPrompt,

    #[error("clip duration must be between 1 and 8 seconds, got {duration_s}s")]
    InvalidDuration { duration_s: u32 },
}

/// Save a session to disk as pretty JSON.
pub fn save_session(path: impl AsRef<Path>, session: &AnimationSessionV1) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        // fs::write does NOT create directories; tests may run with missing `target/`
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(session).context("serialize session to json")?;
    fs::write(path, json).with_context(|| format!("write session file: {}", path.display()))?;
    Ok(())
}

/// Load a session from disk.
pub fn load_session(path: impl AsRef<Path>) -> anyhow::Result<AnimationSessionV1> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read session file: {}", path.display()))?;
    let session: AnimationSessionV1 =
        serde_json::from_str(&data).context("parse session json")?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AnimationSessionV1 {
        AnimationSessionV1::new(CharacterRefV1 {
            source_path: "knight.png".into(),
            description: Some("armored knight".into()),
        })
    }

    #[test]
    fn video_request_needs_both_rendered_poses() {
        let mut s = session();
        assert!(matches!(
            s.video_request(),
            Err(SessionError::MissingPose {
                slot: PoseSlot::Start
            })
        ));

        s.set_pose(PoseSlot::Start, PoseFrameV1::new(PoseOrigin::Drawn, "a.png"));
        s.set_pose(PoseSlot::End, PoseFrameV1::new(PoseOrigin::Uploaded, "b.png"));
        assert!(matches!(
            s.video_request(),
            Err(SessionError::PoseNotRendered {
                slot: PoseSlot::Start
            })
        ));

        s.mark_rendered(PoseSlot::Start, "a_full.png").unwrap();
        s.mark_rendered(PoseSlot::End, "b_full.png").unwrap();
        let req = s.video_request().unwrap();
        assert_eq!(req.start_frame_path, "a_full.png");
        assert_eq!(req.end_frame_path, "b_full.png");
        assert_eq!(req.character_path, "knight.png");
    }

    #[test]
    fn mark_rendered_without_pose_fails() {
        let mut s = session();
        assert!(matches!(
            s.mark_rendered(PoseSlot::End, "x.png"),
            Err(SessionError::MissingPose { slot: PoseSlot::End })
        ));
    }

    #[test]
    fn background_change_invalidates_render() {
        let mut s = session();
        s.set_pose(PoseSlot::Start, PoseFrameV1::new(PoseOrigin::Drawn, "a.png"));
        s.mark_rendered(PoseSlot::Start, "a_full.png").unwrap();

        s.set_background(PoseSlot::Start, BackgroundMode::Original)
            .unwrap();
        assert!(s.pose(PoseSlot::Start).unwrap().is_rendered());

        s.set_background(
            PoseSlot::Start,
            BackgroundMode::Replaced {
                prompt: "castle courtyard".into(),
            },
        )
        .unwrap();
        assert!(!s.pose(PoseSlot::Start).unwrap().is_rendered());
    }

    #[test]
    fn blank_background_prompt_is_rejected() {
        let mut s = session();
        s.set_pose(PoseSlot::End, PoseFrameV1::new(PoseOrigin::Drawn, "b.png"));
        assert!(matches!(
            s.set_background(PoseSlot::End, BackgroundMode::Replaced { prompt: " ".into() }),
            Err(SessionError::EmptyBackgroundPrompt)
        ));
    }

    #[test]
    fn motion_prompt_is_derived_from_pose_prompts() {
        let mut s = session();
        s.set_pose(
            PoseSlot::Start,
            PoseFrameV1::new(PoseOrigin::Prompted { text: "crouching".into() }, "a.png"),
        );
        s.set_pose(
            PoseSlot::End,
            PoseFrameV1::new(PoseOrigin::Prompted { text: "mid-jump".into() }, "b.png"),
        );
        let derived = s.effective_motion_prompt();
        assert!(derived.contains("crouching"));
        assert!(derived.contains("mid-jump"));

        s.set_motion_prompt("  spins around  ");
        assert_eq!(s.effective_motion_prompt(), "spins around");
    }

    #[test]
    fn duration_out_of_range_is_rejected() {
        let mut s = session();
        s.video.duration_s = 12;
        assert!(matches!(
            s.video_request(),
            Err(SessionError::InvalidDuration { duration_s: 12 })
        ));
    }

    #[test]
    fn aspect_serializes_as_ratio_string() {
        let json = serde_json::to_string(&AspectRatio::Portrait9x16).unwrap();
        assert_eq!(json, "\"9:16\"");
    }
}
