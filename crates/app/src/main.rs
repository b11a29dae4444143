mod serve;

use std::{
    path::{Path, PathBuf},
    thread,
};

use clap::{Args, Parser, Subcommand};
use scopewave_core::{
    load_svg, play_loop, run_show_live, run_single_live, save_preview, synthesize_animation,
    synthesize_frame, synthesize_show, write_cycle, write_signal, AppConfig, CancelToken,
    DeviceSink, LiveSettings, PlaybackClock, ScopeError, ShowItem, Signal, SignalAnalysis,
    SourceCollection, SvgDirectory, SvgFile,
};
use tracing_subscriber::EnvFilter;

fn main() -> scopewave_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(&args),
        Commands::Serve { port, config } => {
            let config = load_config(config.as_deref())?;
            serve::run(port, config.source)
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw SVG images on an oscilloscope in X/Y mode", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an SVG file, or a directory of them as a show.
    Render(RenderArgs),
    /// Serve single-frame renders over HTTP.
    Serve {
        #[arg(long, default_value_t = scopewave_core::service::DEFAULT_PORT)]
        port: u16,
        /// JSON config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// SVG file, or a directory of SVG files for show mode.
    input: PathBuf,
    /// Refresh rate in Hz [default: 60]
    #[arg(long)]
    refresh_rate: Option<f64>,
    /// Sample rate in Hz [default: 48000]
    #[arg(long)]
    sample_rate: Option<u32>,
    /// Speed of transit moves relative to drawing [default: 20]
    #[arg(long)]
    transit_speed: Option<f64>,
    /// Length of the output file in seconds [default: 5]
    #[arg(long)]
    duration: Option<f64>,
    /// Seconds each image holds the display in show mode [default: 10]
    #[arg(long)]
    interval: Option<f64>,
    /// Length of the reveal animation in seconds, 0 to disable [default: 0]
    #[arg(long)]
    animate: Option<f64>,
    /// Play to the default audio device until Ctrl+C.
    #[arg(long)]
    play: bool,
    /// Watch the input and update playback as it changes.
    #[arg(long)]
    live: bool,
    /// Output WAV file.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write a PNG of the expected display.
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Side length of the preview image in pixels.
    #[arg(long, default_value_t = 512)]
    preview_size: u32,
    /// JSON config file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl RenderArgs {
    fn config(&self) -> scopewave_core::Result<AppConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(rate) = self.refresh_rate {
            config.render.refresh_rate = rate;
        }
        if let Some(rate) = self.sample_rate {
            config.render.sample_rate = rate;
        }
        if let Some(speed) = self.transit_speed {
            config.render.transit_speed = speed;
        }
        if let Some(duration) = self.duration {
            config.show.duration = duration;
        }
        if let Some(interval) = self.interval {
            config.show.interval = interval;
        }
        if let Some(animate) = self.animate {
            config.show.animation_duration = animate;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: Option<&Path>) -> scopewave_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_json_file(path),
        None => Ok(AppConfig::default()),
    }
}

fn run_render(args: &RenderArgs) -> scopewave_core::Result<()> {
    if !args.input.exists() {
        return Err(ScopeError::SourceNotFound(args.input.clone()));
    }
    let config = args.config()?;

    if args.input.is_dir() {
        tracing::info!(input = %args.input.display(), "directory detected, show mode");
        let directory = SvgDirectory::new(&args.input, config.source.points_per_unit);
        if args.live {
            return run_live_show(&directory, &config);
        }
        run_show(&directory, args, &config)
    } else {
        let source = SvgFile::new(&args.input, config.source.points_per_unit);
        if args.live {
            return run_live_single(&source, &config);
        }
        run_single(&source, args, &config)
    }
}

fn run_single(
    source: &SvgFile,
    args: &RenderArgs,
    config: &AppConfig,
) -> scopewave_core::Result<()> {
    tracing::info!(input = %source.path().display(), "parsing");
    let paths = load_svg(source.path(), config.source.points_per_unit)?;

    tracing::info!(paths = paths.len(), "generating signal");
    let params = config.render.synth_params();
    let cycle = synthesize_frame(&paths, &params);
    report(&cycle, params.sample_rate)?;

    if let Some(preview) = &args.preview {
        save_preview(preview, &cycle, args.preview_size)?;
    }
    if let Some(output) = &args.output {
        write_cycle(output, &cycle, params.sample_rate, config.show.duration)?;
    }
    if args.play {
        play(&cycle, params.sample_rate)?;
    } else if args.output.is_none() && args.preview.is_none() {
        tracing::warn!("no action specified, use --play, --output, --preview or --live");
    }
    Ok(())
}

fn run_show(
    directory: &SvgDirectory,
    args: &RenderArgs,
    config: &AppConfig,
) -> scopewave_core::Result<()> {
    let files = directory.enumerate()?;
    if files.is_empty() {
        return Err(ScopeError::msg("no SVG files found in directory"));
    }
    tracing::info!(count = files.len(), "found SVGs");

    let params = config.render.synth_params();
    let animation = config.show.animation();
    let mut items = Vec::with_capacity(files.len());
    for file in &files {
        let paths = match load_svg(file.path(), config.source.points_per_unit) {
            Ok(paths) => paths,
            Err(err) => {
                tracing::warn!(file = %file.name(), error = %err, "skipping");
                continue;
            }
        };

        let mut item = ShowItem::new(synthesize_frame(&paths, &params));
        if let Some(duration) = animation {
            item = item.with_animation(synthesize_animation(&paths, duration, &params));
        }
        items.push(item);
        tracing::info!(file = %file.name(), "loaded");
    }
    if items.is_empty() {
        return Err(ScopeError::msg("no valid signals generated"));
    }

    tracing::info!(
        duration = config.show.duration,
        interval = config.show.interval,
        animation = config.show.animation_duration,
        "generating show"
    );
    let show = synthesize_show(
        &items,
        config.show.interval,
        config.show.duration,
        params.sample_rate,
    )?;
    report(&show, params.sample_rate)?;

    if let Some(preview) = &args.preview {
        save_preview(preview, &show, args.preview_size)?;
    }
    if let Some(output) = &args.output {
        write_signal(output, &show, params.sample_rate)?;
    }
    if args.play {
        play(&show, params.sample_rate)?;
    }
    Ok(())
}

fn run_live_single(source: &SvgFile, config: &AppConfig) -> scopewave_core::Result<()> {
    let settings = LiveSettings::from_config(config);
    let mut sink = DeviceSink::open(settings.params.sample_rate)?;
    let cancel = cancel_on_ctrl_c();
    tracing::info!(input = %source.path().display(), "live mode, edit the file to update");
    run_single_live(source, &mut sink, &settings, &PlaybackClock::start(), &cancel)
}

fn run_live_show(directory: &SvgDirectory, config: &AppConfig) -> scopewave_core::Result<()> {
    let settings = LiveSettings::from_config(config);
    let mut sink = DeviceSink::open(settings.params.sample_rate)?;
    let cancel = cancel_on_ctrl_c();
    run_show_live(directory, &mut sink, &settings, &PlaybackClock::start(), &cancel)
}

fn play(signal: &Signal, sample_rate: u32) -> scopewave_core::Result<()> {
    let mut sink = DeviceSink::open(sample_rate)?;
    play_loop(signal, &mut sink, &cancel_on_ctrl_c())
}

fn report(signal: &Signal, sample_rate: u32) -> scopewave_core::Result<()> {
    let analysis = SignalAnalysis::of(signal, sample_rate)?;
    tracing::info!(
        samples = analysis.samples,
        seconds = analysis.duration_seconds,
        rms_x = analysis.left.rms,
        rms_y = analysis.right.rms,
        max_step = analysis.max_beam_step,
        "signal ready"
    );
    Ok(())
}

/// Returns a token that is cancelled on the first Ctrl+C.
fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let spawned = thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::warn!(error = %err, "Ctrl+C handling unavailable");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("stopping");
                    token.cancel();
                }
            });
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "Ctrl+C handling unavailable");
    }
    cancel
}
