use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use framesmith::{
    composition::{CancelToken, RenderEngine},
    config::Config,
    fields::{FieldKind, FieldParams, Synthesizer},
    session::SessionValidator,
    FramesmithError,
};

#[derive(Parser)]
#[command(
    name = "framesmith",
    version,
    about = "Render procedural video fields straight into an encoder",
    long_about = "framesmith computes frames from a procedural field (flow, starfield, ball, vortex, pulse, gradient, color_cycle) and streams them as raw RGB into ffmpeg, which writes the final video."
)]
struct Cli {
    /// Field to render (see --list-fields)
    #[arg(short, long)]
    field: Option<FieldKind>,

    /// Output video file; .mp4 is appended when there is no extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Duration minutes (added to --seconds)
    #[arg(long)]
    minutes: Option<f64>,

    /// Duration seconds
    #[arg(short, long)]
    seconds: Option<f64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Identical output frames per computed frame
    #[arg(long)]
    dup: Option<u32>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of stars (starfield)
    #[arg(long)]
    stars: Option<usize>,

    /// Ball radius in pixels (ball)
    #[arg(long)]
    radius: Option<u32>,

    /// Ball speed in pixels per second (ball)
    #[arg(long)]
    speed: Option<f32>,

    /// Draw objects falling into the horizon (vortex)
    #[arg(long)]
    infalling: bool,

    /// Number of infalling objects (vortex)
    #[arg(long)]
    objects: Option<usize>,

    /// Seconds between gradient additions (gradient)
    #[arg(long)]
    segment_seconds: Option<f64>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Encoder executable
    #[arg(long)]
    encoder: Option<String>,

    /// Encoder constant rate factor
    #[arg(long)]
    crf: Option<u8>,

    /// Save a single PNG frame instead of rendering a video
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Logical time of the preview frame in seconds
    #[arg(long, default_value_t = 0.0)]
    preview_at: f64,

    /// List the available fields and exit
    #[arg(long)]
    list_fields: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.list_fields {
        for kind in FieldKind::ALL {
            println!("{:<12} {}", kind, kind.description());
            for (name, description) in Synthesizer::describe(kind).map_err(user_error)?.parameters {
                println!("    {:<20} {}", name, description);
            }
        }
        return Ok(());
    }

    info!("Starting framesmith v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(user_error)?
        }
        None => Config::default(),
    };

    apply_overrides(&cli, &mut config)?;
    config.validate().map_err(user_error)?;

    let session = SessionValidator::new()
        .validate(&config.session)
        .map_err(|e| user_error(e.into()))?;
    let engine = RenderEngine::new(session, config.encoder, config.render);

    if let Some(preview) = &cli.preview {
        engine.save_preview(cli.preview_at, preview).map_err(user_error)?;
        return Ok(());
    }

    let mut handle = engine.spawn();

    let _signals = watch_shutdown_signals(handle.cancel_token())?;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    while !handle.is_finished() {
        ticker.tick().await;
        if let Some(event) = handle.try_progress() {
            info!(
                "   {:5.1}%  {}/{} frames  {:.1} fps",
                event.fraction() * 100.0,
                event.frames_written,
                event.target_frames,
                event.frames_per_second()
            );
        }
    }

    let summary = handle.wait().await.map_err(user_error)?;
    info!(
        "Done: {} frames of {} written to {:?} in {:.1}s",
        summary.frames_written,
        summary.field,
        summary.output,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Cancel the run on Ctrl-C, or on SIGTERM where there is one
///
/// Handlers are registered before this returns, so a signal arriving later is
/// never missed.
fn watch_shutdown_signals(cancel: CancelToken) -> std::io::Result<tokio::task::JoinHandle<()>> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        #[cfg(unix)]
        let received = tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "Interrupt"),
            _ = terminate.recv() => Ok("Terminate signal"),
        };
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await.map(|_| "Interrupt");

        match received {
            Ok(signal) => {
                warn!("{} received, stopping after the current frame", signal);
                cancel.cancel();
            }
            Err(e) => warn!("Could not listen for shutdown signals: {}", e),
        }
    }))
}

/// Log the full error and hand a user-facing message to the exit path
fn user_error(e: FramesmithError) -> anyhow::Error {
    error!("{}", e);
    anyhow::anyhow!(e.user_message())
}

/// Layer command-line flags over the configuration file
fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    let session = &mut config.session;

    if let Some(output) = &cli.output {
        session.output = output.clone();
    }
    if let Some(minutes) = cli.minutes {
        session.minutes = minutes;
    }
    if let Some(seconds) = cli.seconds {
        session.seconds = seconds;
    }
    if let Some(width) = cli.width {
        session.width = width;
    }
    if let Some(height) = cli.height {
        session.height = height;
    }
    if let Some(fps) = cli.fps {
        session.fps = fps;
    }
    if let Some(dup) = cli.dup {
        session.duplication_factor = dup;
    }
    if cli.seed.is_some() {
        session.seed = cli.seed;
    }

    if let Some(kind) = cli.field {
        if session.field.kind() != kind {
            session.field = FieldParams::defaults_for(kind);
        }
    }

    let kind = session.field.kind();
    match &mut session.field {
        FieldParams::Starfield(p) => {
            if let Some(stars) = cli.stars {
                p.stars = stars;
            }
        }
        FieldParams::Ball(p) => {
            if let Some(radius) = cli.radius {
                p.radius = radius;
            }
            if let Some(speed) = cli.speed {
                p.speed = speed;
            }
        }
        FieldParams::Vortex(p) => {
            if cli.infalling {
                p.infalling_objects = true;
            }
            if let Some(objects) = cli.objects {
                p.object_count = objects;
            }
        }
        FieldParams::Gradient(p) => {
            if let Some(segment_seconds) = cli.segment_seconds {
                p.segment_seconds = segment_seconds;
            }
        }
        FieldParams::Flow | FieldParams::Pulse | FieldParams::ColorCycle => {}
    }

    // Parameters for a field other than the one being rendered are a mistake
    let stray = [
        ("--stars", cli.stars.is_some(), FieldKind::Starfield),
        ("--radius", cli.radius.is_some(), FieldKind::Ball),
        ("--speed", cli.speed.is_some(), FieldKind::Ball),
        ("--infalling", cli.infalling, FieldKind::Vortex),
        ("--objects", cli.objects.is_some(), FieldKind::Vortex),
        ("--segment-seconds", cli.segment_seconds.is_some(), FieldKind::Gradient),
    ];
    for (flag, given, owner) in stray {
        if given && owner != kind {
            bail!("{} only applies to the {} field (rendering {})", flag, owner, kind);
        }
    }

    if let Some(program) = &cli.encoder {
        config.encoder.program = program.clone();
    }
    if let Some(crf) = cli.crf {
        config.encoder.crf = crf;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("framesmith").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&["--field", "ball", "--radius", "12", "--seconds", "3", "--crf", "22"]);
        let mut config = Config::default();
        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(config.session.seconds, 3.0);
        assert_eq!(config.encoder.crf, 22);
        match config.session.field {
            FieldParams::Ball(p) => {
                assert_eq!(p.radius, 12);
                assert_eq!(p.speed, 450.0);
            }
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_stray_parameter_is_rejected() {
        let cli = parse(&["--field", "flow", "--stars", "100"]);
        assert!(apply_overrides(&cli, &mut Config::default()).is_err());
    }

    #[test]
    fn test_hyphenated_field_name() {
        let cli = parse(&["--field", "color-cycle"]);
        assert_eq!(cli.field, Some(FieldKind::ColorCycle));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_cancels_run() {
        let cancel = CancelToken::new();
        let watcher = watch_shutdown_signals(cancel.clone()).unwrap();

        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), watcher).await.unwrap().unwrap();
        assert!(cancel.is_cancelled());
    }
}
