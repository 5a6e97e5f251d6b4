//! Broad Phase Stress Test
//!
//! Times the CPU O(n²) sweep against the GPU sphere culler on random sphere
//! sets of increasing size and checks that both report the same pair count.
//!
//! Run with: cargo run --release --bin broadphase_stress
//! Set RUST_LOG=info (or debug) for device and fallback diagnostics.

use std::time::{Duration, Instant};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tumble_engine::compute::GpuBroadPhase;
use tumble_engine::physics::{BroadPhaseSphere, detect_pairs_cpu};

const SPHERE_COUNTS: [usize; 7] = [100, 500, 1_000, 2_000, 5_000, 10_000, 20_000];
const PAIRS_PER_SPHERE: usize = 20;
const WORLD_HALF_SIZE: f32 = 50.0;
const SEED: u64 = 42;

fn random_spheres(rng: &mut StdRng, count: usize) -> Vec<BroadPhaseSphere> {
    (0..count)
        .map(|_| {
            let position = Vec3::new(
                rng.random_range(-WORLD_HALF_SIZE..WORLD_HALF_SIZE),
                rng.random_range(-WORLD_HALF_SIZE..WORLD_HALF_SIZE),
                rng.random_range(-WORLD_HALF_SIZE..WORLD_HALF_SIZE),
            );
            BroadPhaseSphere::new(position, rng.random_range(0.5..2.0))
        })
        .collect()
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let max_objects = SPHERE_COUNTS.iter().copied().max().unwrap_or(0);
    let mut gpu = match GpuBroadPhase::new(max_objects, max_objects * PAIRS_PER_SPHERE) {
        Ok(gpu) => {
            println!("GPU: {} ({:?})", gpu.adapter_info().name, gpu.adapter_info().backend);
            Some(gpu)
        }
        Err(err) => {
            println!("GPU broad phase unavailable ({}), timing CPU only", err);
            None
        }
    };

    let mut rng = StdRng::seed_from_u64(SEED);

    println!();
    println!(
        "{:>8} | {:>10} | {:>10} | {:>10} | {:>10} | {:>8}",
        "spheres", "cpu pairs", "cpu ms", "gpu pairs", "gpu ms", "speedup"
    );
    println!("{}", "-".repeat(71));

    for count in SPHERE_COUNTS {
        let spheres = random_spheres(&mut rng, count);

        let start = Instant::now();
        let cpu_pairs = detect_pairs_cpu(&spheres);
        let cpu_time = start.elapsed();

        let Some(gpu) = gpu.as_mut() else {
            println!(
                "{:>8} | {:>10} | {:>10.2} | {:>10} | {:>10} | {:>8}",
                count,
                cpu_pairs.len(),
                millis(cpu_time),
                "-",
                "-",
                "-"
            );
            continue;
        };

        let start = Instant::now();
        let gpu_result = gpu.detect_pairs(&spheres);
        let gpu_time = start.elapsed();

        match gpu_result {
            Ok(gpu_pairs) => {
                let speedup = cpu_time.as_secs_f64() / gpu_time.as_secs_f64().max(f64::EPSILON);
                println!(
                    "{:>8} | {:>10} | {:>10.2} | {:>10} | {:>10.2} | {:>7.1}x",
                    count,
                    cpu_pairs.len(),
                    millis(cpu_time),
                    gpu_pairs.len(),
                    millis(gpu_time),
                    speedup
                );
                if gpu_pairs.len() != cpu_pairs.len() {
                    log::warn!(
                        "Pair count mismatch at {} spheres: cpu {} gpu {} (reported {})",
                        count,
                        cpu_pairs.len(),
                        gpu_pairs.len(),
                        gpu.last_reported_count()
                    );
                }
            }
            Err(err) => {
                println!("{:>8} | GPU detection failed: {}", count, err);
            }
        }
    }
}
