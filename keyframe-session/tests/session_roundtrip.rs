use keyframe_session::session::{load_session, save_session};
use keyframe_session::{
    AnimationSessionV1, AspectRatio, BackgroundMode, CharacterRefV1, PoseFrameV1, PoseOrigin,
    PoseSlot,
};

#[test]
fn session_roundtrip() {
    let mut s = AnimationSessionV1::new(CharacterRefV1 {
        source_path: "character.png".into(),
        description: None,
    });

    s.set_pose(
        PoseSlot::Start,
        PoseFrameV1::new(PoseOrigin::Drawn, "start_sketch.png"),
    );
    s.set_pose(
        PoseSlot::End,
        PoseFrameV1::new(
            PoseOrigin::Prompted {
                text: "waving both arms".into(),
            },
            "end_sketch.png",
        ),
    );
    s.set_background(
        PoseSlot::End,
        BackgroundMode::Replaced {
            prompt: "sunny beach".into(),
        },
    )
    .unwrap();
    s.mark_rendered(PoseSlot::Start, "start_full.png").unwrap();
    s.mark_rendered(PoseSlot::End, "end_full.png").unwrap();
    s.set_motion_prompt("jumps and waves");
    s.video.aspect = AspectRatio::Portrait9x16;

    let path = std::path::Path::new("target/test_session.keyframe.json");
    save_session(path, &s).unwrap();
    let s2 = load_session(path).unwrap();

    assert_eq!(s, s2);
    let req = s2.video_request().unwrap();
    assert_eq!(req.motion_prompt, "jumps and waves");
    assert_eq!(req.aspect, AspectRatio::Portrait9x16);
}

#[test]
fn loading_missing_file_names_the_path() {
    let err = load_session("target/no_such_session.keyframe.json").unwrap_err();
    assert!(format!("{err:#}").contains("no_such_session"));
}
