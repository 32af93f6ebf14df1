//! `carrier-core` — resumable batch ingestion of SPARQL update files.
//!
//! The pipeline applies a directory of `.sparql` update files to a remote
//! endpoint, at most once per file across process restarts. Three pieces
//! make that work together:
//!
//! - an [`AppliedSet`](cache::AppliedSet) persisted in Redis, recording
//!   which files have already been applied;
//! - a [`CancelSignal`](signal::CancelSignal) polled between files so an
//!   operator can stop an in-progress run without corrupting state;
//! - a three-way [`Outcome`](endpoint::Outcome) from the endpoint client,
//!   so rejected files are quarantined in a failure log while files that
//!   merely hit a transport error are left for the next run to retry.
//!
//! [`controller::IngestController`] ties them into the batch loop.

pub mod cache;
pub mod config;
pub mod controller;
pub mod endpoint;
pub mod error;
pub mod faillog;
pub mod signal;
pub mod unit;

pub use error::{CarrierError, Result};
