//! Basic demonstration of the Narjillos simulation.
//!
//! Run with: cargo run --release --example basic_demo
//! Set RUST_LOG=debug to watch every birth and death.

use narjillos_sim::{Configuration, Experiment, ExperimentStats};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Narjillos - Simulation Demo ===\n");

    let mut config = Configuration::default();
    config.ecosystem.size = 4000.0;
    config.experiment.sample_interval_ticks = 500;

    let mut experiment = Experiment::new(1234, config)?;
    println!(
        "Seed {}: {} eggs, {} food pellets, {} worker threads\n",
        experiment.seed(),
        experiment.ecosystem().number_of_eggs(),
        experiment.ecosystem().number_of_food_pellets(),
        experiment.ecosystem().worker_threads()
    );

    println!("{}", ExperimentStats::header());
    for _ in 0..10 {
        experiment.run(300)?;
        println!("{}", experiment.stats());
        if !experiment.there_are_survivors() {
            println!("\nEverybody died.");
            break;
        }
    }

    println!("\n{}", experiment.ecosystem().profiler().summary());

    let snapshot = experiment.snapshot();
    println!(
        "\nFinal snapshot: {} narjillos, {} eggs, {} food ({} bytes of JSON)",
        snapshot.narjillos.len(),
        snapshot.eggs.len(),
        snapshot.food.len(),
        snapshot.to_json()?.len()
    );
    if let Some(narjillo) = snapshot.narjillos.first() {
        println!("\nOne of the survivors:\n{}", serde_json::to_string_pretty(narjillo)?);
    }

    let stats = experiment.terminate();
    println!("\nCSV: {}\n     {}", ExperimentStats::csv_header(), stats.to_csv_line());
    Ok(())
}
