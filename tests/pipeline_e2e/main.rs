//! Pipeline E2E test suite.
//!
//! Runs the notification pipeline against an in-process mock report source
//! and a recording deliverer. No SMTP server or reporting API is needed.
//!
//! Run with: cargo test --test pipeline_e2e

mod test_helpers;

mod test_multi_project;
mod test_single_report;
