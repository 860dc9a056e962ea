//! cvortex CLI - Redistribute a random particle cloud from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Uniform};

use cvortex::{
    compute::{RedistStats, RedistributionEngine},
    schema::{Particle, Particle2, Particle3, RedistConfig, Strength, total_strength},
};

/// Fixed seed so repeated runs redistribute the same cloud.
const CLOUD_SEED: u64 = 0x0c0f_fee5;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [particles] [dims]", args[0]);
        eprintln!();
        eprintln!("Redistribute a random vortex particle cloud onto a lattice.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to redistribution configuration file");
        eprintln!("  particles    Number of input particles (default: 100000)");
        eprintln!("  dims         2 or 3 (default: 2)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let count: usize = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let dims: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(2);

    let config = RedistConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    println!("cvortex redistribution");
    println!("======================");
    println!("Kernel: {}", config.kernel);
    println!("Grid spacing: {}", config.grid_spacing);
    println!("Negligible fraction: {}", config.negligible_fraction);
    println!("Max output: {}", config.max_output);
    println!("Particles: {} ({}D)", count, dims);
    println!();

    let engine = RedistributionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let mut rng = StdRng::seed_from_u64(CLOUD_SEED);
    match dims {
        2 => {
            let particles = cloud_2d(&mut rng, count);
            run(&engine, &particles);
        }
        3 => {
            let particles = cloud_3d(&mut rng, count);
            run(&engine, &particles);
        }
        other => {
            eprintln!("Unsupported dimension: {} (expected 2 or 3)", other);
            std::process::exit(1);
        }
    }
}

/// Unit square cloud with a Gaussian strength profile.
fn cloud_2d(rng: &mut StdRng, count: usize) -> Vec<Particle2> {
    let position = Uniform::new(0.0f32, 1.0);
    let strength = Normal::new(0.0f32, 1.0).unwrap_or_else(|e| {
        eprintln!("Error building strength distribution: {}", e);
        std::process::exit(1);
    });
    let area = 1.0 / count.max(1) as f32;
    (0..count)
        .map(|_| {
            Particle::new(
                [position.sample(rng), position.sample(rng)],
                strength.sample(rng),
                area,
            )
        })
        .collect()
}

/// Unit cube cloud with Gaussian vorticity components.
fn cloud_3d(rng: &mut StdRng, count: usize) -> Vec<Particle3> {
    let position = Uniform::new(0.0f32, 1.0);
    let strength = Normal::new(0.0f32, 1.0).unwrap_or_else(|e| {
        eprintln!("Error building strength distribution: {}", e);
        std::process::exit(1);
    });
    let volume = 1.0 / count.max(1) as f32;
    (0..count)
        .map(|_| {
            Particle::new(
                [
                    position.sample(rng),
                    position.sample(rng),
                    position.sample(rng),
                ],
                [
                    strength.sample(rng),
                    strength.sample(rng),
                    strength.sample(rng),
                ],
                volume,
            )
        })
        .collect()
}

fn run<const D: usize, V: Strength>(engine: &RedistributionEngine, particles: &[Particle<D, V>]) {
    let initial = total_strength(particles);

    println!("Redistributing...");
    let start = Instant::now();
    let (output, stats) = engine
        .redistribute_with_stats(particles)
        .unwrap_or_else(|e| {
            eprintln!("Redistribution failed: {}", e);
            std::process::exit(1);
        });
    let elapsed = start.elapsed();

    print_stats(&stats);
    println!();
    println!("Total strength: {:?} -> {:?}", initial, total_strength(&output));
    println!(
        "Strength drift: {:e} ({:.4}% of input magnitude)",
        stats.strength_drift,
        stats.strength_drift / initial.magnitude().max(f32::MIN_POSITIVE) * 100.0
    );
    println!(
        "Time: {:.3}s ({:.1} Mparticles/s)",
        elapsed.as_secs_f32(),
        particles.len() as f32 / elapsed.as_secs_f32() / 1.0e6
    );
}

fn print_stats(stats: &RedistStats) {
    println!("  Workers: {}", stats.workers);
    println!("  Touched cells: {}", stats.touched_cells);
    println!("  Soft-pruned: {}", stats.soft_pruned);
    println!("  Hard-pruned: {}", stats.hard_pruned);
    println!("  Truncated: {}", stats.truncated);
    println!(
        "  Output: {} of {} input particles",
        stats.output_particles, stats.input_particles
    );
}

fn print_example_config() {
    let config = RedistConfig::default().with_negligible_fraction(0.001);

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
