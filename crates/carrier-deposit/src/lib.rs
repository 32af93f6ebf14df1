//! `carrier-deposit` — publish dataset archives to an InvenioRDM
//! repository (Zenodo or a compatible instance).
//!
//! The workflow is independent of the ingestion core and shares no state
//! with it:
//!
//! ```text
//! DepositConfig (YAML)
//!     │
//!     ▼
//! build_record()      ← InvenioRDM record JSON from the config
//!     │
//!     ▼
//! DepositClient
//!     ├─ create_draft()    POST /api/records
//!     ├─ upload_file()     register → PUT content → commit,
//!     │                    retried with backoff on transport errors
//!     └─ publish_draft()   POST .../draft/actions/publish
//! ```
//!
//! Transport errors (timeouts, refused connections) retry with capped
//! exponential backoff; HTTP-level errors surface immediately as
//! [`DepositError::Api`] — a 403 will not fix itself by retrying.

pub mod client;
pub mod error;
pub mod metadata;

pub use client::{DepositClient, Draft};
pub use error::{DepositError, Result};
pub use metadata::{build_record, build_record_metadata, DepositConfig};
