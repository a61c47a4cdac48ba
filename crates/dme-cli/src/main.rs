//! DME command-line front end.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

use dme_media::{JobOutcome, SupervisorConfig, TranscodeSupervisor};
use dme_models::{AspectOverride, ContainerFormat, ResolutionMode};

mod logging;
mod settings;

use logging::ConsoleObserver;
use settings::{Settings, DEFAULT_SETTINGS_FILE};

/// Exit code for a job stopped by Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "dme")]
#[command(version, about = "Crop, smooth, scale and re-encode a video with FFmpeg", long_about = None)]
struct Cli {
    /// Source video file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Folder the encoded file is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Apply the blur + bilateral smoothing pair (true/false)
    #[arg(long)]
    filter: Option<bool>,

    /// Gaussian blur strength (0.0 - 3.0)
    #[arg(long)]
    blur: Option<f64>,

    /// Bilateral range strength (0.000 - 0.040)
    #[arg(long)]
    sigma_r: Option<f64>,

    /// Derive the bilateral range strength from the blur strength (true/false)
    #[arg(long)]
    auto_balance: Option<bool>,

    /// Square output size: none, 518, 512, 504 or 392
    #[arg(long)]
    resolution: Option<ResolutionMode>,

    /// Display aspect ratio override, e.g. 1:1 or none
    #[arg(long)]
    aspect: Option<AspectOverride>,

    /// Output container: mp4, mkv or ts
    #[arg(long)]
    format: Option<ContainerFormat>,

    /// Video codec (libx265, libx264, hevc_nvenc)
    #[arg(long)]
    codec: Option<String>,

    /// CRF, or CQ for NVENC codecs
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=51))]
    quality: Option<u8>,

    /// Encoder preset
    #[arg(long)]
    preset: Option<String>,

    /// Settings document to load and update
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Do not write the settings document after the run
    #[arg(long)]
    no_save: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded settings.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(input) = &self.input {
            settings.input = input.display().to_string();
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output = output_dir.display().to_string();
        }
        if let Some(filter) = self.filter {
            settings.use_filter = filter;
        }
        if let Some(blur) = self.blur {
            settings.blur = blur;
        }
        if let Some(sigma_r) = self.sigma_r {
            settings.sigmar = sigma_r;
            // An explicit strength turns auto balance off unless asked for
            settings.auto = false;
        }
        if let Some(auto) = self.auto_balance {
            settings.auto = auto;
        }
        if let Some(resolution) = self.resolution {
            settings.res_mode = resolution;
        }
        if let Some(aspect) = &self.aspect {
            settings.aspect = aspect.clone();
        }
        if let Some(format) = self.format {
            settings.ext = format;
        }
        if let Some(codec) = &self.codec {
            settings.codec = codec.clone();
        }
        if let Some(quality) = self.quality {
            settings.crf = quality;
        }
        if let Some(preset) = &self.preset {
            settings.preset = preset.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    logging::init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(JobOutcome::Completed { .. }) => ExitCode::SUCCESS,
        Ok(JobOutcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Ok(JobOutcome::Failed { .. }) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<JobOutcome> {
    let mut settings = Settings::load(&cli.settings);
    cli.apply_to(&mut settings);
    settings.normalize();

    let config = SupervisorConfig::from_env()
        .context("FFmpeg is required: place it next to dme or on PATH, or set DME_FFMPEG_PATH")?;
    info!(
        transcoder = %config.binaries.transcoder.display(),
        probe_timeout = ?config.probe_timeout,
        "Starting dme"
    );

    let request = settings.to_request();
    let mut supervisor = TranscodeSupervisor::new(config);
    let events = supervisor
        .start(request)
        .context("Could not start the transcode")?;

    let mut observer = ConsoleObserver::new(events.job_id());
    let outcome = {
        let forward = events.forward_to(&mut observer);
        tokio::pin!(forward);

        tokio::select! {
            outcome = &mut forward => outcome,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupt received, cancelling");
                supervisor.cancel();
                forward.await
            }
        }
    };
    debug!(
        lines = observer.lines(),
        last_percent = ?observer.last_percent(),
        "Job finished"
    );

    if !cli.no_save {
        if let Err(e) = settings.save(&cli.settings) {
            warn!("{:#}", e);
        }
    }

    Ok(outcome)
}
