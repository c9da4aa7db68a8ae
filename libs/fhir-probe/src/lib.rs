//! FHIR API probe
//!
//! Scenario harness that exercises a live FHIR REST server (Organization,
//! Practitioner/PractitionerRole and Patient against the uz-core profiles)
//! and tallies every check as passed, failed or skipped.
//!
//! Verbose mode prints each response body with the fields a check cares about
//! emphasised, using [`ferrum_inspect`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrum_probe::{Config, FhirClient, Scenario, TestResults};
//!
//! # async fn example() -> ferrum_probe::Result<()> {
//! let config = Config::load()?;
//! config.validate()?;
//! let client = FhirClient::new(&config)?;
//!
//! let mut total = TestResults::new();
//! for scenario in Scenario::ALL {
//!     total.merge(scenario.run(&client, &config).await?);
//! }
//! total.print_summary();
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod results;
pub mod scenarios;

pub use client::{FhirClient, FhirResponse, RequestOptions};
pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use results::TestResults;
pub use scenarios::{normalize, Scenario};
