//! svctop: per-service traffic totals for flow exports and packet captures.
//!
//! Each flow is keyed by its protocol and the lower of its two ports, looked
//! up in a services file, and its packet and byte counts are added to the
//! service found (or to "Unrecognized"). The totals are then ranked into a
//! top-N report with everything past N folded into one "other" row.

pub mod aggregate;
pub mod chart;
pub mod classify;
pub mod config;
pub mod error;
pub mod iana;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod services;
pub mod sniff;

pub use error::{Error, Result};
