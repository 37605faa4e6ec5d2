use std::time::Instant;

use scatter_life::scatterlife::{ScatterLife, ScatterLifeConfig};

fn bench_scatter(size: usize, generations: u64) -> (f64, u64) {
    let config = ScatterLifeConfig::default()
        .dimensions(size, size)
        .seed(0x5EED_1234_ABCD_EF01);
    let mut engine = ScatterLife::with_config(config).expect("benchmark config is valid");

    let start = Instant::now();
    engine.step_n(generations).expect("benchmark run failed");
    let duration = start.elapsed();

    (duration.as_secs_f64() * 1000.0, engine.population())
}

fn main() {
    let scales: &[(usize, u64)] = &[
        (256, 200),  // grid fits in L2, collective overhead dominates
        (512, 200),
        (1024, 100), // reference size
        (2048, 50),
        (4096, 20),
    ];

    println!(
        "{:<10} {:>12} {:>12} {:>10} {:>10}",
        "Grid", "Generations", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(58));

    for &(size, generations) in scales {
        let (total_ms, pop) = bench_scatter(size, generations);
        let avg_ms = total_ms / generations as f64;
        println!(
            "{:<10} {:>12} {:>12.1} {:>10.4} {:>10}",
            format!("{}x{}", size, size),
            generations,
            total_ms,
            avg_ms,
            pop
        );
    }
}
