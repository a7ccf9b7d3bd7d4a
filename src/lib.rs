//! Test report notifier library.
//!
//! Fetches the latest test-run report of each tracked project, aggregates
//! them and delivers a single notification email.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
