// demos/scan_demo.rs
//! Scan a five-unit pool and print the stimulus-response curve

use mune_sim::motor::noise::NoiseModel;
use mune_sim::motor::scan::{generate_scan, linspace};
use mune_sim::motor::{MotorPool, MotorUnit};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("MUNE-Sim Scan Demo");
    println!("==================");

    let amplitudes = [0.03, 0.04, 0.05, 0.06, 0.07];
    let thresholds = linspace(24.0, 29.0, amplitudes.len());
    let pool = MotorPool::from_units(
        amplitudes
            .iter()
            .zip(thresholds)
            .map(|(&amplitude, threshold)| MotorUnit::new(amplitude, threshold, 0.33)),
    );

    for entry in &pool {
        println!(
            "{}: amplitude {:.2} mV, threshold {:.2} mA",
            entry.id, entry.unit.amplitude, entry.unit.threshold
        );
    }

    let stimuli = linspace(20.0, 33.0, 450);
    let mut rng = StdRng::seed_from_u64(1);
    let scan = generate_scan(&pool, &stimuli, &NoiseModel::new(0.0, 0.002), &mut rng)?;

    println!("\n{:>10} {:>10}", "stimulus", "response");
    for (stimulus, response) in scan.pairs().step_by(15) {
        let bar = "#".repeat((response.max(0.0) * 200.0) as usize);
        println!("{:>10.2} {:>10.4} {}", stimulus, response, bar);
    }

    println!("\nMaximum response: {:.4} mV", scan.max_response().unwrap_or(0.0));
    println!("Pool total:       {:.4} mV", pool.total_amplitude());
    Ok(())
}
