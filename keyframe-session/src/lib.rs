//! keyframe-session: the durable animation project for Keyframe.
//!
//! A session is one character being animated. It stores:
//! - the character reference the poses are rendered from
//! - the start and end pose frames (how each was made, where it lives,
//!   whether its background was replaced)
//! - the motion description and video settings
//!
//! The session never talks to a model itself; it only records what the host
//! did and assembles the final video request once everything is in place.

/// Schema version written into every saved session.
pub const SESSION_SCHEMA_VERSION: &str = "1.0";

pub mod session;

pub use session::{
    load_session, save_session, AnimationSessionV1, AspectRatio, BackgroundMode, CharacterRefV1,
    PoseFrameV1, PoseOrigin, PoseSlot, SessionError, VideoRequestV1, VideoSettingsV1,
    SESSION_FILE_EXT,
};
