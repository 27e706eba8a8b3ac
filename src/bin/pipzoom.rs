use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pipzoom", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a keyed foreground over a background video and encode an MP4
    /// (requires `ffmpeg` on PATH).
    Compose(ComposeArgs),
    /// Composite a single frame at a timestamp and write it as a PNG.
    Frame(FrameArgs),
    /// Print the zoom effect's phase and scale over time.
    Timeline(TimelineArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Background (main) video.
    #[arg(long)]
    background: PathBuf,

    /// Blue-screen foreground video.
    #[arg(long)]
    foreground: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Compose configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// SRT file burned into the output.
    #[arg(long, conflicts_with = "auto_subtitles")]
    subtitles: Option<PathBuf>,

    /// Burn `<background stem>_en.srt` if it exists next to the background video.
    #[arg(long)]
    auto_subtitles: bool,

    /// Seed for the randomized hold durations.
    #[arg(long)]
    seed: Option<u64>,

    /// Composite frames on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = 23)]
    crf: u8,

    /// Log progress every N frames.
    #[arg(long, default_value_t = 100)]
    progress_every: u64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[arg(long)]
    background: PathBuf,

    #[arg(long)]
    foreground: PathBuf,

    /// Timestamp in seconds from the start of both clips.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Length of the table in seconds.
    #[arg(long)]
    duration: f64,

    /// Sampling interval in seconds.
    #[arg(long, default_value_t = 0.5)]
    step: f64,

    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Timeline(args) => cmd_timeline(args),
    }
}

fn read_config(path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<pipzoom::ComposeConfig> {
    let mut cfg = match path {
        Some(p) => pipzoom::ComposeConfig::load(p)?,
        None => pipzoom::ComposeConfig::default(),
    };
    if let Some(seed) = seed {
        cfg.session.seed = seed;
    }
    Ok(cfg)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut cfg = read_config(args.config.as_deref(), args.seed)?;
    if args.parallel {
        cfg.session.parallel = true;
    }
    if args.threads.is_some() {
        cfg.session.threads = args.threads;
    }

    let subtitle_path = match (&args.subtitles, args.auto_subtitles) {
        (Some(p), _) => Some(p.clone()),
        (None, true) => {
            let found = pipzoom::SubtitleTrack::find_sibling(&args.background, "_en");
            if found.is_none() {
                tracing::info!(
                    background = %args.background.display(),
                    "no sibling subtitle file found"
                );
            }
            found
        }
        (None, false) => None,
    };
    let style = cfg.subtitles.clone().unwrap_or_default();

    let mut session = pipzoom::ComposeSession::new(cfg)?
        .with_progress(pipzoom::LogProgress::new(args.progress_every));
    if let Some(path) = subtitle_path {
        let track = pipzoom::SubtitleTrack::new(&path, style)
            .with_context(|| format!("subtitles '{}'", path.display()))?;
        session = session.with_subtitles(track);
    }

    let mut background = pipzoom::FfmpegSource::open(&args.background)
        .with_context(|| format!("open background '{}'", args.background.display()))?;
    let mut foreground = pipzoom::FfmpegSource::open(&args.foreground)
        .with_context(|| format!("open foreground '{}'", args.foreground.display()))?;

    let mut opts = pipzoom::FfmpegSinkOpts::new(&args.out);
    opts.crf = args.crf;
    let mut sink = pipzoom::FfmpegSink::new(opts);

    let stats = session.run(&mut background, &mut foreground, &mut sink)?;

    eprintln!(
        "wrote {} ({} frames, {} skipped)",
        args.out.display(),
        stats.frames_composited,
        stats.frames_skipped
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref(), args.seed)?;
    let session = pipzoom::ComposeSession::new(cfg)?;

    let background = pipzoom::source::decode_frame_at(&args.background, args.time)
        .with_context(|| format!("decode background '{}'", args.background.display()))?;
    let foreground = pipzoom::source::decode_frame_at(&args.foreground, args.time)
        .with_context(|| format!("decode foreground '{}'", args.foreground.display()))?;

    let frame = session.render_frame(background, &foreground, args.time)?;
    pipzoom::encode::save_png(&args.out, &frame.image)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    if !(args.duration.is_finite() && args.duration >= 0.0) {
        anyhow::bail!("--duration must be finite and >= 0 (got {})", args.duration);
    }
    if !(args.step.is_finite() && args.step > 0.0) {
        anyhow::bail!("--step must be finite and > 0 (got {})", args.step);
    }

    let cfg = read_config(args.config.as_deref(), args.seed)?;
    let timeline = pipzoom::EffectTimeline::new(cfg.effect, cfg.session.seed, args.duration)?;

    println!("{:>9}  {:>5}  {:<16}  {:>6}", "time", "cycle", "phase", "scale");
    let steps = (args.duration / args.step).floor() as u64;
    for i in 0..=steps {
        let t = i as f64 * args.step;
        let s = timeline.sample(t);
        println!(
            "{:>9.3}  {:>5}  {:<16}  {:>6.3}",
            t,
            s.cycle_index,
            s.phase.to_string(),
            s.scale
        );
    }
    Ok(())
}
