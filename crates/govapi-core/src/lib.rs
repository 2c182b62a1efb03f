//! # govapi-core
//!
//! Exemption retrieval-and-classification pipeline for the policy exemption API.
//!
//! - **Records**: [`ExemptionRecord`], a schema-flexible JSON object with typed accessors
//! - **Filtering**: [`FilterMode`] and the expiry evaluator, day-window validation
//! - **Projection**: full or reduced views of a record
//! - **Grouping**: records grouped by owning policy assignment, deterministically ordered
//! - **Service**: [`ExemptionService`]: list, get and update-expiry against the management API
//! - **Errors**: [`ExemptionError`] via `thiserror`

#![deny(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod endpoint;
pub mod errors;
pub mod filter;
pub mod grouping;
pub mod http;
pub mod logging;
pub mod projection;
pub mod record;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use endpoint::ManagementEndpoint;
pub use errors::ExemptionError;
pub use filter::FilterMode;
pub use grouping::GroupedExemptions;
pub use http::{AccessToken, HttpClient, HttpResponse};
pub use projection::ProjectedRecord;
pub use record::ExemptionRecord;
pub use service::{ExemptionService, ListOptions};
