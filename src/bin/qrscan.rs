use clap::{Parser, Subcommand};
use qr_scanner::media::ImageSequenceDevices;
use qr_scanner::{AnimationFrameLoop, QrScanner, ScanError, ScannerSettings, TickOutcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrscan", version, about = "Live QR scanner over image-sequence frames")]
struct Cli {
    /// Settings file (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play frames through the scanner and print every decoded payload
    Scan {
        /// Frame images, or directories of them, played in order
        #[arg(required = true)]
        frames: Vec<PathBuf>,
        /// Replay the frames until stopped by --max-frames or --once
        #[arg(long = "loop")]
        repeat: bool,
        /// Stop after the first decoded payload
        #[arg(long)]
        once: bool,
        /// Upper bound on ticks
        #[arg(long)]
        max_frames: Option<u64>,
        /// Save the final surface (frame plus overlay) to this image
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
    /// Print the effective settings as TOML
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Command::Scan {
            frames,
            repeat,
            once,
            max_frames,
            overlay,
        } => scan_cmd(&settings, &frames, repeat, once, max_frames, overlay.as_deref()),
        Command::Config => config_cmd(&settings),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("qrscan: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<ScannerSettings, ScanError> {
    let settings = match path {
        Some(path) => ScannerSettings::load(path)?,
        None => ScannerSettings::default(),
    };
    Ok(settings.with_env_overrides())
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp" | "tif" | "tiff")
    )
}

fn expand_frames(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut frames = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let read = std::fs::read_dir(input).map_err(|source| ScanError::Io {
                path: input.clone(),
                source,
            })?;
            let mut entries: Vec<PathBuf> = read
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            entries.sort();
            frames.extend(entries);
        } else {
            frames.push(input.clone());
        }
    }
    Ok(frames)
}

fn scan_cmd(
    settings: &ScannerSettings,
    inputs: &[PathBuf],
    looping: bool,
    once: bool,
    max_frames: Option<u64>,
    overlay: Option<&Path>,
) -> Result<(), ScanError> {
    let frames = expand_frames(inputs)?;
    let devices = ImageSequenceDevices::from_paths(&frames)?.looping(looping);
    println!("Frames: {}", devices.frame_count());

    let mut scanner = QrScanner::from_settings(settings, devices);
    scanner.init();
    scanner.on_data(|text| println!("{text}"));

    let token = scanner.try_start()?;

    let mut frame_loop = AnimationFrameLoop::from_settings(&settings.frame_loop);
    if let Some(max) = max_frames {
        frame_loop = frame_loop.max_frames(max);
    }
    let summary = frame_loop.run_with(&mut scanner, token, |scanner, outcome| {
        let decoded = matches!(outcome, TickOutcome::Decoded(_));
        if (once && decoded) || scanner.capture_source().has_ended() {
            scanner.stop();
        }
    });
    scanner.stop();

    println!(
        "Ticks: {} (decoded {}, no code {}, waiting {})",
        summary.ticks, summary.decoded, summary.no_code, summary.waiting
    );

    if let Some(path) = overlay {
        scanner.snapshot().save(path)?;
        println!("Overlay written to {}", path.display());
    }
    Ok(())
}

fn config_cmd(settings: &ScannerSettings) -> Result<(), ScanError> {
    print!("{}", settings.to_toml_string()?);
    Ok(())
}
