//! Performance regression check: ScatterLife against the serial reference.
//!
//! Runs multiple scenarios and reports timing. Use with `--release` for meaningful results.
//! Compare output across commits to detect regressions.

use std::time::Instant;

use scatter_life::scatterlife::{ScatterLife, ScatterLifeConfig};
use scatter_life::serial::SerialLife;

struct Scenario {
    name: &'static str,
    width: usize,
    height: usize,
    warmup: u64,
    generations: u64,
    seed: u64,
}

fn run_scatter(s: &Scenario) -> (f64, u64) {
    let config = ScatterLifeConfig::default()
        .dimensions(s.width, s.height)
        .seed(s.seed);
    let mut engine = ScatterLife::with_config(config).expect("scenario config is valid");
    engine.step_n(s.warmup).expect("warmup failed");

    let start = Instant::now();
    engine.step_n(s.generations).expect("scenario run failed");
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, engine.population())
}

fn run_serial(s: &Scenario) -> (f64, u64) {
    let mut engine = SerialLife::initialize(s.width, s.height, s.seed);
    engine.step_n(s.warmup);

    let start = Instant::now();
    engine.step_n(s.generations);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, engine.population())
}

fn main() {
    let scenarios = [
        Scenario {
            name: "small-square",
            width: 256,
            height: 256,
            warmup: 3,
            generations: 200,
            seed: 0xA1,
        },
        Scenario {
            name: "wide-strip",
            width: 4096,
            height: 64,
            warmup: 3,
            generations: 200,
            seed: 0xB2,
        },
        Scenario {
            name: "tall-strip",
            width: 64,
            height: 4096,
            warmup: 3,
            generations: 200,
            seed: 0xC3,
        },
        Scenario {
            name: "reference",
            width: 1024,
            height: 1024,
            warmup: 3,
            generations: 100,
            seed: 1_646_868,
        },
        Scenario {
            name: "large",
            width: 4096,
            height: 4096,
            warmup: 2,
            generations: 10,
            seed: 0xF6,
        },
    ];

    println!(
        "{:<16} {:>8} {:>8} {:>12} {:>12} {:>10}",
        "Scenario", "Engine", "Gens", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(72));

    for s in &scenarios {
        let (scatter_ms, scatter_pop) = run_scatter(s);
        let (serial_ms, serial_pop) = run_serial(s);
        for (engine, total_ms, pop) in [
            ("scatter", scatter_ms, scatter_pop),
            ("serial", serial_ms, serial_pop),
        ] {
            println!(
                "{:<16} {:>8} {:>8} {:>12.3} {:>12.6} {:>10}",
                s.name,
                engine,
                s.generations,
                total_ms,
                total_ms / s.generations as f64,
                pop
            );
        }
        if scatter_pop != serial_pop {
            println!("{:<16} population MISMATCH", s.name);
        }
    }
}
