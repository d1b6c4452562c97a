use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use curvecard::{AssetStore, Card, Dimensions, Fps, FrameIndex, Theme};

#[derive(Parser, Debug)]
#[command(name = "curvecard", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame range as numbered PNGs.
    Frames(FramesArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Canvas width in pixels.
    #[arg(long, default_value_t = 412.0)]
    width: f64,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 270.0)]
    height: f64,

    /// Frame rate used to place the schedule on frames.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Frame index (0-based). Mutually exclusive with --time-ms.
    #[arg(long, conflicts_with = "time_ms")]
    frame: Option<u64>,

    /// Timestamp in milliseconds, rounded to the nearest frame.
    #[arg(long = "time-ms")]
    time_ms: Option<f64>,

    /// Directory holding arrow_up.png, glow.png, label_font.ttf.
    #[arg(long = "assets-root")]
    assets_root: Option<PathBuf>,

    /// Theme overrides as a JSON file; missing fields use defaults.
    #[arg(long)]
    theme: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[arg(long, default_value_t = 412.0)]
    width: f64,

    #[arg(long, default_value_t = 270.0)]
    height: f64,

    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// First frame index.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Number of frames to render.
    #[arg(long)]
    count: u64,

    #[arg(long = "assets-root")]
    assets_root: Option<PathBuf>,

    #[arg(long)]
    theme: Option<PathBuf>,

    /// Output directory; frames land as frame_000000.png etc.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let theme = load_theme(args.theme.as_deref())?;
    let mut card = Card::new(
        Dimensions {
            width: args.width,
            height: args.height,
        },
        Fps::new(args.fps, 1)?,
        theme,
    )?;
    let assets = load_assets(args.assets_root.as_deref());

    let frame = match (args.frame, args.time_ms) {
        (Some(f), _) => FrameIndex(f),
        (None, Some(ms)) => card.frame_at_millis(ms),
        (None, None) => FrameIndex(0),
    };

    let out = card.render_frame(frame, &assets)?;
    write_png(&args.out, &out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let theme = load_theme(args.theme.as_deref())?;
    let mut card = Card::new(
        Dimensions {
            width: args.width,
            height: args.height,
        },
        Fps::new(args.fps, 1)?,
        theme,
    )?;
    let assets = load_assets(args.assets_root.as_deref());

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    card.render_frames(FrameIndex(args.start), args.count, &assets, |f, out| {
        let path = args.out_dir.join(format!("frame_{:06}.png", f.0));
        write_png(&path, out).map_err(curvecard::CardError::from)?;
        Ok(())
    })?;
    eprintln!("wrote {} frames to {}", args.count, args.out_dir.display());
    Ok(())
}

fn load_theme(path: Option<&std::path::Path>) -> anyhow::Result<Theme> {
    let Some(path) = path else {
        return Ok(Theme::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read theme '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse theme '{}'", path.display()))
}

fn load_assets(root: Option<&std::path::Path>) -> AssetStore {
    match root {
        Some(root) => AssetStore::load(root),
        None => AssetStore::empty(),
    }
}

fn write_png(path: &std::path::Path, frame: &curvecard::FrameRgba8) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
