// Headless artboard driver: draws a figure or loads a pose, then writes a PNG.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use egui::{pos2, Color32};
use keyframe_ai::FixedPoseSource;
use keyframe_core::EncodedImage;
use keyframe_ui::editor::PALETTE;
use keyframe_ui::{Artboard, ArtboardConfig, PoseOutcome};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sketch", version)]
struct Cli {
    /// Artboard config JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, default_value = "target/sketch.png")]
    out: PathBuf,

    /// Image to load as if a model had generated it for `--prompt`.
    #[arg(long)]
    pose: Option<PathBuf>,

    /// Pose description sent along with `--pose`.
    #[arg(long, default_value = "standing, arms raised")]
    prompt: String,

    /// Draw with straight segments instead of smoothed curves.
    #[arg(long)]
    no_smoothing: bool,

    /// Give each limb its own palette color instead of the configured brush color.
    #[arg(long)]
    colorful: bool,
}

fn main() -> anyhow::Result<()> {
    keyframe_ui::init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ArtboardConfig::load(path)?,
        None => ArtboardConfig::default(),
    };
    let mut board = Artboard::from_config(&config);
    if cli.no_smoothing {
        board.set_smoothing(false);
    }

    match &cli.pose {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("read pose image: {}", path.display()))?;
            let source = FixedPoseSource::new(EncodedImage::from_bytes(bytes));
            let outcome =
                pollster::block_on(board.request_pose_from_prompt(&source, &cli.prompt))?;
            if let PoseOutcome::Applied(placement) = outcome {
                info!(?placement, "pose loaded");
            }
        }
        None => draw_figure(&mut board, cli.colorful),
    }

    let png = board.export_image()?;
    if let Some(parent) = cli.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }
    fs::write(&cli.out, png.as_bytes())
        .with_context(|| format!("write png: {}", cli.out.display()))?;
    info!(
        path = %cli.out.display(),
        history = board.history_len(),
        "sketch written"
    );
    Ok(())
}

/// A stick figure scaled to the artboard, one stroke per limb.
fn draw_figure(board: &mut Artboard, colorful: bool) {
    let size = board.dimensions();
    let w = size.width as f32;
    let h = size.height as f32;
    let at = |fx: f32, fy: f32| pos2(fx * w, fy * h);

    let limbs: [&[(f32, f32)]; 5] = [
        // head
        &[
            (0.50, 0.12),
            (0.56, 0.15),
            (0.56, 0.22),
            (0.50, 0.25),
            (0.44, 0.22),
            (0.44, 0.15),
            (0.50, 0.12),
        ],
        // torso
        &[(0.50, 0.25), (0.50, 0.40), (0.50, 0.55)],
        // arms
        &[(0.30, 0.20), (0.38, 0.30), (0.50, 0.32), (0.62, 0.30), (0.70, 0.20)],
        // left leg
        &[(0.50, 0.55), (0.44, 0.70), (0.40, 0.88)],
        // right leg
        &[(0.50, 0.55), (0.56, 0.70), (0.60, 0.88)],
    ];

    // Skip white; it would vanish on the blank surface.
    let swatches = PALETTE.iter().filter(|c| **c != Color32::WHITE).cycle();
    for (limb, color) in limbs.into_iter().zip(swatches) {
        if colorful {
            board.set_brush_color(*color);
        }
        let (first, rest) = match limb.split_first() {
            Some(split) => split,
            None => continue,
        };
        board.begin_stroke(at(first.0, first.1));
        for p in rest {
            board.extend_stroke(at(p.0, p.1));
        }
        board.end_stroke();
    }
}
