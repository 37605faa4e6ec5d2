//! ScatterLife as an MPI job: one process per worker.
//!
//! Launch with exactly eight ranks, e.g. `mpirun -n 8 scatter-life-mpi`.
//! Rank 0 seeds the grid, writes `gen{N}.txt` snapshots and prints the
//! timing line.

use std::path::PathBuf;
use std::process::ExitCode;

use scatter_life::LifeError;
use scatter_life::scatterlife::mpi::{MpiComm, run_world};
use scatter_life::scatterlife::{
    Communicator, DEFAULT_GENERATIONS, DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH,
    ScatterLifeConfig, WORKER_COUNT,
};
use scatter_life::snapshot::{DumpDir, SnapshotSink};
use tracing::{error, info};

const USAGE: &str = "usage: mpirun -n 8 scatter-life-mpi [--width N] [--height N] \
[--generations N] [--seed N] [--dump-dir PATH | --no-dump]";

struct MpiArgs {
    config: ScatterLifeConfig,
    generations: u64,
    dump_dir: Option<PathBuf>,
}

fn parse_args() -> Result<MpiArgs, String> {
    let mut out = MpiArgs {
        config: ScatterLifeConfig::default()
            .dimensions(DEFAULT_WIDTH, DEFAULT_HEIGHT)
            .seed(DEFAULT_SEED),
        generations: DEFAULT_GENERATIONS,
        dump_dir: Some(PathBuf::from("dumps")),
    };
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{flag} requires a value"));
        match flag.as_str() {
            "--dump-dir" => out.dump_dir = Some(PathBuf::from(value()?)),
            "--no-dump" => out.dump_dir = None,
            "--width" | "--height" | "--generations" | "--seed" => {
                let n: u64 = value()?
                    .parse()
                    .map_err(|_| format!("{flag} requires a non-negative integer"))?;
                match flag.as_str() {
                    "--width" => out.config.width = n as usize,
                    "--height" => out.config.height = n as usize,
                    "--generations" => out.generations = n,
                    _ => out.config.seed = n,
                }
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(out)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let Some(universe) = mpi::initialize() else {
        error!("MPI was already initialized");
        return ExitCode::FAILURE;
    };
    let comm = MpiComm::new(universe.world());
    let coordinator = comm.rank() == 0;

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            if coordinator {
                eprintln!("{msg}\n{USAGE}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Every rank sees the same size and config, so these exits need no abort.
    if comm.size() != WORKER_COUNT {
        if coordinator {
            error!(size = comm.size(), expected = WORKER_COUNT, "wrong number of MPI ranks");
        }
        return ExitCode::FAILURE;
    }

    let mut dump = None;
    if let (true, Some(dir)) = (coordinator, &args.dump_dir) {
        match DumpDir::create(dir) {
            Ok(d) => dump = Some(d),
            Err(source) => {
                error!("{}", LifeError::DumpDir { path: dir.clone(), source });
                comm.abort();
            }
        }
    }
    let sink = dump.as_mut().map(|d| d as &mut (dyn SnapshotSink + Send));

    match run_world(&comm, &args.config, args.generations, sink) {
        Ok(Some(report)) => {
            println!("Parallel life: {}ms", report.elapsed.as_millis());
            info!(population = report.population, "run finished");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err @ (LifeError::Dimensions { .. } | LifeError::WorkerCount { .. })) => {
            if coordinator {
                error!("{err}");
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(rank = comm.rank(), "{err}");
            comm.abort();
            ExitCode::FAILURE
        }
    }
}
