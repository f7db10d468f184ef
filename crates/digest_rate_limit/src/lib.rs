//! Rate limiting for calls to the summarization API.
//!
//! The remote API enforces three independent quotas. Each one is tracked by a
//! [`QuotaWindow`] holding a rolling log of consumption:
//! - requests per minute
//! - tokens per minute
//! - requests per day
//!
//! The [`AdmissionController`] combines the three windows under a single lock
//! and decides whether a request is granted, must wait, or can never fit.
//! [`RequestGate`] is what callers use: it admits and reserves atomically,
//! sleeping and re-checking while the quota is exhausted.
//!
//! ```
//! use digest_rate_limit::{AdmissionController, ConfigurableLimits, RequestGate};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = Arc::new(AdmissionController::new(ConfigurableLimits::default())?);
//! let gate = RequestGate::new(controller);
//!
//! let admission = gate.acquire(1_200).await?;
//! assert_eq!(*admission.estimated_tokens(), 1_200);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod controller;
mod gate;
mod tier;
pub mod tiers;
mod window;

pub use config::{ConfigurableLimits, QuotaLimit, window_duration};
pub use controller::{AdmissionController, AdmissionDecision, WindowUsage};
pub use digest_error::QuotaKind;
pub use gate::{Admission, RequestGate};
pub use tier::Tier;
pub use tiers::GeminiTier;
pub use window::{QuotaWindow, Rejection};
