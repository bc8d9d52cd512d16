mod demo;
mod storage;
mod trace;

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::Duration;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use embedded_graphics::geometry::Point;
use embedded_hal::delay::DelayNs;
use tact_gui::canvas::{DisplayTransport, DrawCommand};
use tact_sys::{Storage, StorageError};
use tact_touch::calibrate::CALIBRATION_KEY;
use tact_touch::{calibrate_touchscreen, load_calibration, CalibrationMatrix, TouchCalibrationSession};
use crate::storage::FileStorage;
use crate::trace::TraceInput;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Subcommands,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Compute a calibration from three `raw_x,raw_y=screen_x,screen_y` correspondences.
    Solve {
        #[arg(short, long = "point", value_parser = parse_correspondence, required = true)]
        points: Vec<(Point, Point)>,
        /// Write the record here instead of printing it.
        #[arg(short, long)]
        out_file: Option<PathBuf>,
    },

    /// Decode a stored calibration record.
    Inspect {
        record: PathBuf,
    },

    /// Calibrate from a recorded touch trace, storing the result.
    Calibrate {
        #[arg(short, long)]
        storage: PathBuf,
        #[arg(long, action)]
        binary: bool,
        /// Ignore any stored calibration.
        #[arg(long, action)]
        force: bool,
        #[arg(long, default_value_t = 3)]
        attempts: u8,
        trace: PathBuf,
    },

    /// Play a touch trace through the colour picker screen.
    Replay {
        /// Load the calibration from here. Without it, the trace is taken to be in screen
        /// coordinates.
        #[arg(short, long)]
        storage: Option<PathBuf>,
        #[arg(long, action)]
        binary: bool,
        /// Print every draw command.
        #[arg(short, long, action)]
        verbose: bool,
        trace: PathBuf,
    },
}

use Subcommands::*;

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("`{s}` is not `x,y`"))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("`{x}`: {e}"))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("`{y}`: {e}"))?;
    Ok(Point::new(x, y))
}

fn parse_correspondence(s: &str) -> Result<(Point, Point), String> {
    let (raw, screen) = s.split_once('=').ok_or_else(|| format!("`{s}` is not `raw=screen`"))?;
    Ok((parse_point(raw)?, parse_point(screen)?))
}

fn print_matrix(matrix: &CalibrationMatrix) {
    println!("screen_x = {} * raw_x + {} * raw_y + {}", matrix.a, matrix.b, matrix.c);
    println!("screen_y = {} * raw_x + {} * raw_y + {}", matrix.d, matrix.e, matrix.f);
}

fn read_trace(path: &Path, binary: bool) -> Result<TraceInput> {
    if binary {
        let data = std::fs::read(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
        TraceInput::from_wire(&data)
    } else {
        let text = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
        TraceInput::parse(&text)
    }
}

fn solve(points: &[(Point, Point)], out_file: Option<PathBuf>) -> Result<()> {
    let [(r0, s0), (r1, s1), (r2, s2)] = points[..] else {
        bail!("exactly three points are needed, got {}", points.len());
    };

    let matrix = CalibrationMatrix::solve(&[r0, r1, r2], &[s0, s1, s2])?;
    let record = matrix.serialize()?;
    print_matrix(&matrix);

    match out_file {
        Some(path) => std::fs::write(&path, record).wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", record.iter().map(|b| format!("{b:02x}")).collect::<String>()),
    }
    Ok(())
}

fn inspect(path: PathBuf) -> Result<()> {
    let data = std::fs::read(&path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let matrix = CalibrationMatrix::deserialize(&data)?;
    print_matrix(&matrix);
    Ok(())
}

struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}

fn calibrate(storage: PathBuf, trace: PathBuf, binary: bool, force: bool, attempts: u8) -> Result<()> {
    let mut storage = FileStorage::new(storage);
    if force {
        match storage.invalidate(CALIBRATION_KEY) {
            Ok(()) | Err(StorageError::NotFound) => {}
            Err(e) => return Err(e).wrap_err("failed to remove the stored calibration"),
        }
    }

    let mut input = read_trace(&trace, binary)?;
    let session = TouchCalibrationSession::for_screen(demo::SCREEN);
    let (matrix, source) = calibrate_touchscreen(
        &mut storage,
        &session,
        &mut input,
        &mut HostDelay,
        attempts,
        |n, target| println!("target {}: ({}, {})", n + 1, target.x, target.y),
    )?;

    println!("{source:?} calibration:");
    print_matrix(&matrix);
    if input.remaining() > 0 {
        println!("{} trace events left over", input.remaining());
    }
    Ok(())
}

/// Prints a line per flushed batch.
struct PrintTransport {
    batches: usize,
    verbose: bool,
}

impl DisplayTransport for PrintTransport {
    type Error = Infallible;

    fn submit(&mut self, batch: &[DrawCommand<'_>]) -> Result<(), Infallible> {
        self.batches += 1;
        println!("batch {}: {} commands", self.batches, batch.len());
        if self.verbose {
            for command in batch {
                println!("    {command:?}");
            }
        }
        Ok(())
    }
}

fn replay(storage: Option<PathBuf>, trace: PathBuf, binary: bool, verbose: bool) -> Result<()> {
    let calibration = match storage {
        Some(dir) => load_calibration(&mut FileStorage::new(dir)).wrap_err("no usable stored calibration")?,
        None => CalibrationMatrix::IDENTITY,
    };

    let input = read_trace(&trace, binary)?;
    let transport = PrintTransport { batches: 0, verbose };
    let (replay, _) = demo::replay(input, calibration, demo::screen()?, transport, |click| {
        println!("clicked {} ({})", demo::label(click.widget), click.event)
    })?;

    println!(
        "{} events, {} clicks, {}",
        replay.passes,
        replay.clicks.len(),
        if replay.finished { "finished" } else { "trace ended before Continue" }
    );
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    match args.command {
        Solve { points, out_file } => solve(&points, out_file),
        Inspect { record } => inspect(record),
        Calibrate { storage, binary, force, attempts, trace } => calibrate(storage, trace, binary, force, attempts),
        Replay { storage, binary, verbose, trace } => replay(storage, trace, binary, verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correspondences() {
        assert_eq!(
            parse_correspondence("100, 200=80,60"),
            Ok((Point::new(100, 200), Point::new(80, 60)))
        );
        assert!(parse_correspondence("100,200").is_err());
        assert!(parse_correspondence("100;200=80,60").is_err());
        assert!(parse_correspondence("a,200=80,60").is_err());
    }

    #[test]
    fn solve_needs_three_points() {
        let two = [(Point::new(0, 0), Point::new(0, 0)), (Point::new(1, 0), Point::new(1, 0))];
        assert!(solve(&two, None).is_err());

        let collinear = [
            (Point::new(0, 0), Point::new(0, 0)),
            (Point::new(1, 1), Point::new(1, 0)),
            (Point::new(2, 2), Point::new(0, 1)),
        ];
        assert!(solve(&collinear, None).is_err());
    }

    #[test]
    fn solved_record_can_be_inspected() {
        let path = std::env::temp_dir().join(format!("tacttool-solve-{}", std::process::id()));
        let points = [
            (Point::new(800, 600), Point::new(80, 60)),
            (Point::new(1600, 1800), Point::new(160, 180)),
            (Point::new(2400, 1200), Point::new(240, 120)),
        ];
        solve(&points, Some(path.clone())).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), tact_touch::RECORD_BYTES);
        inspect(path.clone()).unwrap();

        std::fs::write(&path, [0u8; 3]).unwrap();
        assert!(inspect(path.clone()).is_err());
        std::fs::remove_file(path).unwrap();
    }
}
