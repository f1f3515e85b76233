//! Test harness for generated parts.
//!
//! Builds parts through the real assembly path and checks them with
//! oracles that report instead of panicking.
//!
//! # Key Components
//!
//! - [`PartRun`]: fluent API for building and checking a part
//! - [`oracle`]: verification functions returning pass/fail verdicts
//! - [`report`]: plain-text part summaries
//! - [`assertions`]: `Result`-returning assertions with diagnostics
//! - [`helpers`]: the harness error type and area/volume formulas

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::PartReport;
pub use workflow::PartRun;
