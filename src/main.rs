//! Symbio CLI - Run a coevolutionary arena from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::{SeedableRng, rngs::StdRng};

use symbio::evolve::{EvolutionRun, FitnessEvaluator, RunArchive};
use symbio::schema::EvolutionConfig;
use symbio::sim::ImmigrationSim;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [archive_dir]", args[0]);
        eprintln!();
        eprintln!("Run a coevolutionary arena from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  archive_dir  Directory for elite snapshots and the fusion log");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    println!("Symbio Arena");
    println!("============");
    println!(
        "Population: {} seeds of {}x{} (density {})",
        config.pop_size, config.s_xspan, config.s_yspan, config.seed_density
    );
    println!(
        "Operators: fission {} / fusion {} / sexual otherwise",
        config.prob_fission, config.prob_fusion
    );
    println!(
        "Trials per pair: {} (arena {}x / {}x, time {}x)",
        config.num_trials, config.width_factor, config.height_factor, config.time_factor
    );
    println!("Generations: {}", config.num_generations);
    println!();

    let mut run = EvolutionRun::new(config.clone(), ImmigrationSim).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    if let Some(dir) = args.get(2) {
        let run_id = format!(
            "run-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        );
        let archive = RunArchive::create(dir, &run_id).unwrap_or_else(|e| {
            eprintln!("Error opening archive directory: {}", e);
            std::process::exit(1);
        });
        println!("Archiving to {} as {}", dir, run_id);
        println!();
        run = run.with_archive(archive);
    }

    println!("Running...");
    let start = Instant::now();
    let report_every = (config.num_generations / 10).max(1);

    let result = run.run_with_callback(|progress, report| {
        if progress.generation % report_every == 0 {
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                "  Generation {}/{}: best={:.3}, mean={:.3}, {:.2} events/s",
                progress.generation,
                config.num_generations,
                progress.best_fitness,
                progress.mean_fitness,
                progress.generation as f32 / elapsed
            );
            println!("    {}", report);
        }
    });

    let progress = result.unwrap_or_else(|e| {
        eprintln!("Run aborted: {}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    let best = run.ledger().best();

    // Absolute check: the best seed against shuffled copies of itself.
    let evaluator = FitnessEvaluator::new(&config);
    let mut rng = StdRng::from_entropy();
    let absolute = evaluator
        .score_against_shuffled(&ImmigrationSim, &mut rng, best, 20)
        .unwrap_or_else(|e| {
            eprintln!("Absolute fitness check failed: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("Final state:");
    println!("  Best fitness: {:.3}", progress.best_fitness);
    println!("  Mean fitness: {:.3}", progress.mean_fitness);
    println!(
        "  Best seed: {}x{} with {} live cells at address {}",
        best.xspan, best.yspan, best.num_living, best.address
    );
    println!("  Absolute fitness vs shuffled self: {:.3}", absolute);
    println!("{}", best);
    println!(
        "Time: {:.2}s ({:.2} events/s)",
        elapsed.as_secs_f32(),
        progress.generation as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = EvolutionConfig::default();
    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
}
