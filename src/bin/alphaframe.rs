use std::path::{Path, PathBuf};

use alphaframe::{FrameSource as _, PlaybackDriver as _};
use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "alphaframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a directory of decoded atlas frames into PNGs.
    Render(RenderArgs),
    /// Print the generated fragment shader for N overlay sources.
    Shader(ShaderArgs),
    /// Print the layout, timing and sources of a descriptor.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Animation descriptor JSON.
    #[arg(long)]
    descriptor: PathBuf,

    /// Directory of atlas frames (PNG, sorted by name).
    #[arg(long)]
    frames: PathBuf,

    /// Output directory for composited PNGs.
    #[arg(long)]
    out: PathBuf,

    /// Overlay bitmap as `tag=path` (tag without brackets, or the source id).
    #[arg(long = "image", value_parser = parse_image_arg)]
    images: Vec<(String, PathBuf)>,

    /// Output width (default: descriptor display width).
    #[arg(long)]
    width: Option<u32>,

    /// Output height (default: descriptor display height).
    #[arg(long)]
    height: Option<u32>,

    /// Render at most this many frames.
    #[arg(long)]
    limit: Option<usize>,

    /// Only accept a software adapter.
    #[arg(long)]
    fallback_adapter: bool,
}

#[derive(Parser, Debug)]
struct ShaderArgs {
    /// Overlay source count.
    #[arg(long, default_value_t = 0)]
    count: usize,

    /// Validate the WGSL with naga before printing.
    #[arg(long)]
    validate: bool,

    /// Print the vertex stage instead.
    #[arg(long)]
    vertex: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Animation descriptor JSON.
    #[arg(long)]
    descriptor: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Shader(args) => cmd_shader(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn parse_image_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (key, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected tag=path, got '{raw}'"))?;
    if key.is_empty() || path.is_empty() {
        return Err(format!("expected tag=path, got '{raw}'"));
    }
    Ok((key.to_owned(), PathBuf::from(path)))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut source = alphaframe::JsonFrameSource::from_path(&args.descriptor);
    for (key, path) in &args.images {
        let path = std::path::absolute(path)
            .with_context(|| format!("resolve image path '{}'", path.display()))?;
        source = source.with_image_path(key.clone(), path);
    }

    let mut driver =
        alphaframe::FrameSequenceDriver::from_dir(&args.frames, Default::default())?;
    if let Some(limit) = args.limit {
        driver.truncate(limit);
    }

    let config = alphaframe::PlayerConfig {
        width: args.width,
        height: args.height,
        gpu: alphaframe::GpuOptions {
            force_fallback_adapter: args.fallback_adapter,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut player = alphaframe::AlphaVideoPlayer::new(driver, config);
    player.play_blocking(source)?;
    if player.mode() == alphaframe::PlaybackMode::Plain {
        eprintln!("warning: compositing unavailable, writing plain atlas frames");
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let mut written = 0usize;
    while let Some(timing) = player.driver_mut().poll_frame() {
        let outcome = player.render_tick(timing);
        let image = match outcome {
            alphaframe::TickOutcome::Composited(_) => player.read_frame()?.into_image()?,
            alphaframe::TickOutcome::Plain => player
                .driver()
                .current_frame()
                .cloned()
                .context("driver presented no frame")?,
        };
        let path = args.out.join(format!("frame_{written:05}.png"));
        write_png(&path, &image)?;
        written += 1;
    }

    player.destroy();
    eprintln!("wrote {written} frames to {}", args.out.display());
    Ok(())
}

fn write_png(path: &Path, image: &image::RgbaImage) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_shader(args: ShaderArgs) -> anyhow::Result<()> {
    let src = if args.vertex {
        alphaframe::VERTEX_SHADER.to_owned()
    } else {
        alphaframe::fragment_source(args.count)
    };
    if args.validate {
        alphaframe::validate_wgsl(&src)?;
        eprintln!("shader ok");
    }
    print!("{src}");
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut source = alphaframe::JsonFrameSource::from_path(&args.descriptor);
    source.prepare()?;
    let metadata = source
        .metadata()
        .context("descriptor prepared without metadata")?;

    println!("{}", serde_json::to_string_pretty(metadata)?);
    println!("annotated frames: {}", source.annotated_frames());
    Ok(())
}
