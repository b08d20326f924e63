use clap::Parser;
use env_logger::Env;
use log::info;
use rayon::prelude::*;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use yoopernet::error::YooperError;
use yoopernet::loader::container::read_text_container;
use yoopernet::loader::observatory::{parse_time, ObservatoryData};
use yoopernet::rotation::rotate::{RotationOptions, DEFAULT_SMOOTHING_WINDOW, MIN_SAMPLES};
use yoopernet::utils::constants::{DEFAULT_CYCLE_COUNT, TIME_FORMAT};
use yoopernet::utils::station::StationReference;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Station day text export(s) to rotate
    #[arg(num_args = 1.., required = true)]
    infiles: Vec<PathBuf>,

    /// Station name in the station table
    #[arg(long, default_value = "yoopernet")]
    station: String,

    /// Station table to use instead of the built-in one
    #[arg(long)]
    station_file: Option<PathBuf>,

    /// Magnetometer cycle count, sets the counts to nT sensitivity
    #[arg(long, default_value_t = DEFAULT_CYCLE_COUNT)]
    cycle_count: f64,

    /// Number of leading samples to skip when estimating the orientation
    #[arg(long, default_value_t = 0, conflicts_with = "start_time")]
    start_index: usize,

    /// Skip samples before this time (YYYY_MM_DD_HH_MM_SS) when estimating the orientation
    #[arg(long, visible_alias = "st")]
    start_time: Option<String>,

    /// Median filter length for the rotated components, 0 to disable
    #[arg(short = 'w', long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    smoothing_window: usize,

    /// Skip the diagnostic report
    #[arg(short, long)]
    quiet: bool,
}

fn bin_main() -> BinResult<()> {
    let args = Args::parse();

    let station = match &args.station_file {
        Some(path) => StationReference::from_file(path, &args.station)?,
        None => StationReference::lookup(&args.station)?,
    };
    let start_time = args.start_time.as_deref().map(parse_time).transpose()?;

    let mut records = vec![];
    for path in &args.infiles {
        let container = read_text_container(path)?;
        records.push((path, ObservatoryData::load(&container, args.cycle_count)?));
    }

    // Rotate the records!
    let results: Vec<Result<(), YooperError>> = records
        .par_iter_mut()
        .map(|(path, data)| {
            let start_index = match start_time {
                Some(t) => data.seek(t).unwrap_or(data.time.len()),
                None => args.start_index,
            };
            let options = RotationOptions {
                start_index,
                smoothing_window: args.smoothing_window,
                verbose: !args.quiet,
                min_samples: MIN_SAMPLES,
            };
            info!("Rotating {}", path.display());
            data.rotate_mag(&station, &options)?;
            Ok(())
        })
        .collect();
    for res in results {
        res?;
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (path, data) in &records {
        writeln!(out, "# {}", path.display())?;
        writeln!(out, "# time bx by bz (nT)")?;
        if let (Some(bx), Some(by), Some(bz)) = (&data.bx, &data.by, &data.bz) {
            for (i, t) in data.time.iter().enumerate() {
                writeln!(
                    out,
                    "{} {:.3} {:.3} {:.3}",
                    t.format(TIME_FORMAT),
                    bx[i],
                    by[i],
                    bz[i]
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
