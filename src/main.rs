#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use scatter_life::scatterlife::{
    DEFAULT_GENERATIONS, DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH, ScatterLife,
    ScatterLifeConfig,
};
use scatter_life::serial::SerialLife;
use scatter_life::grid::buffer_len;
use scatter_life::snapshot::{Discard, DumpDir, SnapshotSink};
use scatter_life::{LifeError, LifeResult, PaddedGrid};
use tracing::{Level, error, info, warn};

const DEFAULT_DUMP_DIR: &str = "dumps";
const USAGE: &str = "usage: scatter-life [--width N] [--height N] [--generations N] [--seed N] \
[--dump-dir PATH | --no-dump] [--serial | --check] [--verbose]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Parallel,
    Serial,
    Check,
}

struct MainArgs {
    config: ScatterLifeConfig,
    generations: u64,
    dump_dir: Option<PathBuf>,
    mode: Mode,
    verbose: bool,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut args_out = MainArgs {
        config: ScatterLifeConfig::default()
            .dimensions(DEFAULT_WIDTH, DEFAULT_HEIGHT)
            .seed(DEFAULT_SEED),
        generations: DEFAULT_GENERATIONS,
        dump_dir: Some(PathBuf::from(DEFAULT_DUMP_DIR)),
        mode: Mode::Parallel,
        verbose: false,
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value\n{USAGE}"))
    };
    let number = |i: usize, flag: &str| -> u64 {
        next_arg(i, flag)
            .parse()
            .unwrap_or_else(|_| panic!("{flag} requires a non-negative integer\n{USAGE}"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                args_out.config.width = number(i, "--width") as usize;
            }
            "--height" => {
                i += 1;
                args_out.config.height = number(i, "--height") as usize;
            }
            "--generations" => {
                i += 1;
                args_out.generations = number(i, "--generations");
            }
            "--seed" => {
                i += 1;
                args_out.config = args_out.config.seed(number(i, "--seed"));
            }
            "--dump-dir" => {
                i += 1;
                args_out.dump_dir = Some(PathBuf::from(next_arg(i, "--dump-dir")));
            }
            "--no-dump" => args_out.dump_dir = None,
            "--serial" => args_out.mode = Mode::Serial,
            "--check" => args_out.mode = Mode::Check,
            "--verbose" => args_out.verbose = true,
            other => panic!("unknown argument: {other}\n{USAGE}"),
        }
        i += 1;
    }
    args_out
}

fn run_parallel(args: &MainArgs, sink: &mut (dyn SnapshotSink + Send)) -> LifeResult<()> {
    let mut engine = ScatterLife::with_config(args.config.clone())?;
    info!(
        width = args.config.width,
        height = args.config.height,
        population = engine.population(),
        "initial grid seeded"
    );
    let report = engine.run(args.generations, &mut LoggingSink(sink))?;
    println!("Parallel life: {}ms", report.elapsed.as_millis());
    info!(population = report.population, "run finished");
    Ok(())
}

fn run_serial(args: &MainArgs, sink: &mut (dyn SnapshotSink + Send)) -> LifeResult<()> {
    let (width, height) = (args.config.width, args.config.height);
    if width == 0 || height == 0 || buffer_len(width, height).is_none() {
        return Err(LifeError::Dimensions {
            width,
            height,
            reason: "grid must be non-empty and addressable",
        });
    }
    let mut engine = SerialLife::initialize(width, height, args.config.seed);
    let report = engine.run(args.generations, &mut LoggingSink(sink))?;
    println!("Serial life: {}ms", report.elapsed.as_millis());
    info!(population = report.population, "run finished");
    Ok(())
}

/// Step both engines in lockstep and compare whole grids each generation.
fn run_checked(args: &MainArgs) -> LifeResult<()> {
    let mut parallel = ScatterLife::with_config(args.config.clone())?;
    let mut serial = SerialLife::new(parallel.grid().clone());
    let mut parallel_total = std::time::Duration::ZERO;
    let mut serial_total = std::time::Duration::ZERO;

    for generation in 0..args.generations {
        let start = Instant::now();
        parallel.step()?;
        parallel_total += start.elapsed();

        let start = Instant::now();
        serial.step();
        serial_total += start.elapsed();

        let status = if parallel.grid() == serial.grid() {
            "MATCH"
        } else {
            "MISMATCH"
        };
        println!(
            "Generation {generation}: ScatterLife pop = {}, SerialLife pop = {} [{status}]",
            parallel.population(),
            serial.population()
        );
        if status == "MISMATCH" {
            warn!(generation, "engines diverged");
        }
    }

    let parallel_ms = parallel_total.as_secs_f64() * 1000.0;
    let serial_ms = serial_total.as_secs_f64() * 1000.0;
    println!("\n--- Summary ({} generations) ---", args.generations);
    println!("ScatterLife: {parallel_ms:.3} ms total");
    println!("SerialLife:  {serial_ms:.3} ms total");
    println!("Speedup (SerialLife / ScatterLife): {:.2}x", serial_ms / parallel_ms);
    Ok(())
}

/// Announces each finished generation, then forwards to the real sink.
struct LoggingSink<'a>(&'a mut (dyn SnapshotSink + Send));

impl SnapshotSink for LoggingSink<'_> {
    fn persist(&mut self, generation: u64, grid: &PaddedGrid) -> std::io::Result<()> {
        self.0.persist(generation, grid)?;
        info!(generation, "generation ended");
        Ok(())
    }
}

fn run(args: &MainArgs) -> LifeResult<()> {
    if args.mode == Mode::Check {
        return run_checked(args);
    }
    let mut dump;
    let mut discard = Discard;
    let sink: &mut (dyn SnapshotSink + Send) = match &args.dump_dir {
        Some(dir) => {
            dump = DumpDir::create(dir).map_err(|source| LifeError::DumpDir {
                path: dir.clone(),
                source,
            })?;
            &mut dump
        }
        None => &mut discard,
    };
    match args.mode {
        Mode::Serial => run_serial(args, sink),
        _ => run_parallel(args, sink),
    }
}

fn main() -> ExitCode {
    let args = parse_args();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
