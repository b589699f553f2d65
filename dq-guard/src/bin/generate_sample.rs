//! Generate the sample dataset used by demos and benchmarks.
//!
//! Writes 105 rows (100 base rows plus 5 exact duplicates) to the path given
//! as the first argument, `data/sample.csv` by default.

use std::path::PathBuf;

use dq_guard::logging::setup::{init_logging, LoggingConfig};
use dq_guard::test_fixtures::{write_sample_csv, SAMPLE_BASE_ROWS, SAMPLE_DUPLICATES};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default())?;

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/sample.csv"));

    println!("Generating sample data...");
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    write_sample_csv(&output)?;
    println!(
        "  Wrote {} rows ({SAMPLE_DUPLICATES} duplicates) to {output:?}",
        SAMPLE_BASE_ROWS + SAMPLE_DUPLICATES
    );
    println!("Sample data generated successfully!");
    Ok(())
}
