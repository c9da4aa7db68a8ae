//! Run FHIR API test scenarios against a live server
//!
//! Usage:
//!   fhir-probe                          # all scenarios
//!   fhir-probe organization             # only organization checks
//!   fhir-probe patient practitioner     # patient and practitioner checks
//!   fhir-probe org pract pat            # short names also work

use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::Parser;
use colored::Colorize;
use ferrum_probe::{init_logging, normalize, Config, FhirClient, Scenario, TestResults};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(name = "fhir-probe")]
#[clap(about = "Run FHIR API test scenarios against a live server")]
struct Args {
    /// Scenarios to run (organization, practitioner, patient, or all).
    /// Short names accepted (org, pract, pat).
    #[clap(value_parser = PossibleValuesParser::new(Scenario::CHOICES))]
    scenarios: Vec<String>,

    /// Configuration file (defaults to ./fhir-probe.toml when present)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// FHIR base URL, overrides configuration
    #[clap(short = 'u', long)]
    base_url: Option<String>,

    /// Do not print requests and responses
    #[clap(short, long)]
    quiet: bool,

    /// Keep created resources on the server
    #[clap(long)]
    no_cleanup: bool,

    /// Seconds to wait for search indexing after seeding data
    #[clap(long)]
    indexing_delay: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if self.quiet {
            config.verbose = false;
        }
        if self.no_cleanup {
            config.cleanup_after_tests = false;
        }
        if let Some(delay) = self.indexing_delay {
            config.indexing_delay_seconds = delay;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging)?;

    let scenarios = normalize(&args.scenarios);
    print_header(&config, &scenarios);

    let client = FhirClient::new(&config).context("Failed to build HTTP client")?;
    let start = Instant::now();
    let mut all_results = Vec::with_capacity(scenarios.len());

    for (i, scenario) in scenarios.iter().enumerate() {
        match scenario.run(&client, &config).await {
            Ok(results) => {
                info!(
                    scenario = scenario.name(),
                    passed = results.passed,
                    failed = results.failed,
                    skipped = results.skipped,
                    "Scenario finished"
                );
                all_results.push(results);
            }
            Err(e) => {
                error!(scenario = scenario.name(), error = %e, "Scenario aborted");
                println!(
                    "{}",
                    format!("{} tests failed with exception: {e}", scenario.title()).red()
                );
                return Ok(ExitCode::FAILURE);
            }
        }
        if i + 1 < scenarios.len() {
            println!("\n{}\n", "-".repeat(70).bold());
        }
    }

    let elapsed = start.elapsed();
    let suites_run = all_results.len();
    let total: TestResults = all_results.into_iter().collect();

    let rule = "=".repeat(70);
    println!("\n{}", rule.bold());
    println!("{}", "Overall Test Results".bold());
    println!("{}", rule.bold());
    println!("\nTest Suites Run: {suites_run}");
    println!("Time Elapsed: {:.2} seconds", elapsed.as_secs_f64());

    if total.print_summary() {
        println!("\n{}\n", "✓ All tests passed!".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("\n{}\n", "✗ Some tests failed".red().bold());
        Ok(ExitCode::FAILURE)
    }
}

fn print_header(config: &Config, scenarios: &[Scenario]) {
    let rule = "=".repeat(70);
    println!("\n{}", rule.bold());
    println!("{}", "FHIR API Test Suite".bold());
    println!("{}", rule.bold());
    println!("\nTesting against: {}", config.base_url.blue());
    let names = scenarios
        .iter()
        .map(Scenario::name)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Scenarios: {}\n", names.cyan());
}
