//! chipcrush
//!
//! Renders an audio file the way a retro console's sample hardware would have played it
//! back and writes the result as WAV.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use chipcrush::audio_engine::errors::EngineError;
use chipcrush::audio_engine::profiles::ConsoleProfile;
use chipcrush::audio_engine::sample_loader::decode_audio_file_with_progress;
use chipcrush::audio_engine::sample_writer::{WavFormat, write_wav};
use chipcrush::{Console, ConsoleSettings, convert, setup_logger};

/// Command line arguments for chipcrush
#[derive(Parser)]
#[command(name = "chipcrush")]
#[command(about = "Degrade audio to the sample playback of a retro game console")]
struct Args {
    /// Audio file to convert
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,

    /// WAV file to write
    #[arg(required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Console to emulate (nes, snes, gameboy, gba)
    #[arg(short, long, required_unless_present = "list")]
    console: Option<Console>,

    /// Index into the console's sample rate table (defaults to the console's default)
    #[arg(short, long)]
    rate_index: Option<usize>,

    /// Amplitude bit depth (defaults to the console's default)
    #[arg(short, long)]
    bit_depth: Option<u32>,

    /// Delta step bit depth, DPCM consoles only (defaults to the console's default)
    #[arg(short, long)]
    slope_bit_depth: Option<u32>,

    /// Write 32-bit float samples instead of 16-bit integers
    #[arg(long)]
    float: bool,

    /// List console profiles and exit
    #[arg(long)]
    list: bool,
}

fn print_profile(profile: &ConsoleProfile) {
    println!("{} ({})", profile.name, profile.encoding);
    println!(
        "  bit depth:       {}..={} (default {})",
        profile.bit_depths.start(),
        profile.bit_depths.end(),
        profile.default_bit_depth
    );
    if let (Some(range), Some(default)) =
        (&profile.slope_bit_depths, profile.default_slope_bit_depth)
    {
        println!(
            "  slope bit depth: {}..={} (default {})",
            range.start(),
            range.end(),
            default
        );
    }
    println!("  sample rates:");
    for (index, rate) in profile.sample_rates.iter().enumerate() {
        let marker = if index == profile.default_sample_rate_index {
            " (default)"
        } else {
            ""
        };
        println!("    [{index:>2}] {rate} Hz{marker}");
    }
}

fn settings_from_args(console: Console, args: &Args) -> ConsoleSettings {
    let defaults = ConsoleSettings::defaults(console);
    ConsoleSettings {
        console,
        sample_rate_index: args.rate_index.unwrap_or(defaults.sample_rate_index),
        bit_depth: args.bit_depth.unwrap_or(defaults.bit_depth),
        slope_bit_depth: args.slope_bit_depth.or(defaults.slope_bit_depth),
    }
}

fn run(
    input: &Path,
    output: &Path,
    settings: &ConsoleSettings,
    format: WavFormat,
) -> Result<(), EngineError> {
    let params = settings.resolve()?;

    let mut next_report = 0.25;
    let source = decode_audio_file_with_progress(input, |percent| {
        if percent >= next_report {
            log::debug!("Decoding {}: {:.0}%", input.display(), percent * 100.0);
            while next_report <= percent {
                next_report += 0.25;
            }
        }
    })?;

    let crushed = convert(&source, &params)?;
    write_wav(output, &crushed, format)?;

    log::info!(
        "{} -> {} as {} ({:.2}s)",
        input.display(),
        output.display(),
        settings.console,
        crushed.duration_sec()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logger();

    if args.list {
        for console in Console::ALL {
            print_profile(console.profile());
        }
        return ExitCode::SUCCESS;
    }

    let (Some(input), Some(output), Some(console)) = (&args.input, &args.output, args.console)
    else {
        log::error!("input, output and --console are required");
        return ExitCode::FAILURE;
    };

    let settings = settings_from_args(console, &args);
    let format = if args.float {
        WavFormat::Float32
    } else {
        WavFormat::Pcm16
    };

    match run(input, output, &settings, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
