//! Guided face capture demo running the pipeline against a simulated subject.

use anyhow::{bail, Context, Result};
use clap::Parser;
use face_capture_pipeline::{
    alignment::CaptureAngle,
    capture::{CaptureEvent, JpegStillEncoder},
    config::Config,
    pipeline::{CapturePipeline, PipelineEvent},
    session::CapturedImage,
    simulation::{ScriptedCamera, SimulatedSubject, SyntheticFace},
};
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Directory the captured stills are written to
    #[arg(short, long, default_value = "captures")]
    output: PathBuf,

    /// Give up after this many seconds without a complete session
    #[arg(short, long, default_value = "60")]
    timeout: u64,

    /// Simulated frame width
    #[arg(long, default_value = "640")]
    width: u32,

    /// Simulated frame height
    #[arg(long, default_value = "480")]
    height: u32,

    /// Grey level of the simulated scene (0-255)
    #[arg(short, long, default_value = "140")]
    brightness: u8,

    /// Simulated frame interval in milliseconds
    #[arg(long, default_value = "33")]
    frame_ms: u64,

    /// Override the stabilizer tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face capture pipeline demo");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(tick_ms) = args.tick_ms {
        config.stabilizer.tick_period_ms = tick_ms;
    }

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config).context("Failed to serialize configuration")?);
        return Ok(());
    }

    let images = run_session(&args, &config)?;
    write_images(&args.output, &images)?;

    Ok(())
}

fn run_session(args: &Args, config: &Config) -> Result<Vec<CapturedImage>> {
    let subject = SimulatedSubject::new(Some(SyntheticFace::frontal()));
    let camera =
        ScriptedCamera::new(args.width, args.height, args.brightness).with_interval(Duration::from_millis(args.frame_ms));

    let mut pipeline = CapturePipeline::start(
        config,
        Box::new(camera),
        Box::new(subject.detector(config.landmarks.clone())),
        Box::new(JpegStillEncoder::new(config.capture.jpeg_quality)),
    )
    .context("Failed to start capture pipeline")?;

    pipeline.confirm_ready()?;

    let deadline = Instant::now() + Duration::from_secs(args.timeout);
    let mut following: Option<CaptureAngle> = None;
    let mut last_progress = None;

    while Instant::now() < deadline {
        let snapshot = pipeline.snapshot();
        if let Some(fault) = &snapshot.fault {
            bail!("Pipeline fault: {fault}");
        }

        // The simulated subject follows the on-screen guidance
        let angle = snapshot.phase.angle();
        if angle.is_some() && angle != following {
            if let (Some(angle), Some(guidance)) = (angle, snapshot.guidance) {
                info!("Step {}/{}: {}", snapshot.captured + 1, snapshot.required, guidance);
                subject.turn_to(angle, config.capture.mirrored);
            }
            following = angle;
        }
        if last_progress != Some(snapshot.progress) {
            log::debug!(
                "Progress {}% signals {:?} debug {:?}",
                snapshot.progress,
                snapshot.signals,
                snapshot.debug
            );
            last_progress = Some(snapshot.progress);
        }

        match pipeline.next_event_timeout(config.stabilizer.tick_period()) {
            Some(PipelineEvent::Capture(CaptureEvent::Captured { angle, image })) => {
                info!("Captured {} still ({} bytes)", angle, image.encoded.len());
            }
            Some(PipelineEvent::Capture(CaptureEvent::CaptureFailed { angle, reason })) => {
                log::warn!("Capture of {} failed: {}", angle, reason);
            }
            Some(PipelineEvent::Capture(CaptureEvent::SessionComplete { images })) => {
                info!("Session complete with {} stills", images.len());
                pipeline.stop();
                return Ok(images);
            }
            Some(PipelineEvent::Fault(reason)) => bail!("Pipeline fault: {reason}"),
            None => {}
        }
    }

    pipeline.stop();
    bail!("No complete session after {} seconds", args.timeout)
}

fn write_images(output: &Path, images: &[CapturedImage]) -> Result<()> {
    fs::create_dir_all(output).with_context(|| format!("Failed to create {}", output.display()))?;

    for image in images {
        let name = format!("{}_{}.jpg", image.angle, image.captured_at.format("%Y%m%dT%H%M%S%.3fZ"));
        let path = output.join(name);
        fs::write(&path, &image.encoded).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}
