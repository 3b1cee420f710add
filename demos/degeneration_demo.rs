// demos/degeneration_demo.rs
//! Follow one simulated individual through every degeneration step

use mune_sim::config::ConfigLoader;
use mune_sim::export::MemorySink;
use mune_sim::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};
use mune_sim::simulation::{ExperimentCondition, SimulationDriver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("MUNE-Sim Degeneration Demo");
    println!("==========================");

    let config = ConfigLoader::new().load()?;
    let summary = config.get_summary();
    println!("Configuration loaded");
    println!("  - Units per pool: {}", summary.unit_count);
    println!("  - Scan length: {} stimuli", summary.scan_length);
    println!("  - Minimum viable pool: {}", summary.min_viable_pool);

    let driver = SimulationDriver::new(config)?;
    let sink = MemorySink::new();

    for reinnervation in ReinnervationPolicy::ALL {
        let condition = ExperimentCondition::new(DenervationPolicy::Selective, reinnervation, 0.6);
        let report = driver.run_trajectory(condition, 1, &sink);

        println!("\n{}", condition);
        println!("{:>6} {:>14} {:>16}", "units", "max response", "total amplitude");
        for point in &report.trajectory.points {
            println!(
                "{:>6} {:>14.4} {:>16.4}",
                point.pool_size, point.max_response, point.total_amplitude
            );
        }
        if let Some(error) = &report.failure {
            println!("trajectory ended early: {}", error);
        }
    }

    println!("\n{} scans held in memory", sink.scan_count());
    Ok(())
}
