//! Yandex Cloud operations for keeper.
//!
//! ```text
//! ServiceAccountKey ──PS256 JWT──▶ IamClient ──IAM token──▶ CachedTokenProvider
//!                                                              │ (jwt_cache.json)
//!                                                              ▼
//!                               ComputeClient ── list / start / stop ──▶ Compute API
//!                                     │
//!                                     ▼
//!                            autostart::auto_start_stopped
//! ```

pub mod autostart;
pub mod cache;
pub mod compute;
pub mod doctor;
pub mod error;
pub mod iam;
pub mod token;

pub use autostart::{AutoStartReport, FailedInstance, StartedInstance, auto_start_stopped, list_all};
pub use cache::{CachedToken, TokenCache};
pub use compute::{ComputeApi, ComputeClient, http_client};
pub use doctor::{CheckResult, DoctorReport, doctor};
pub use error::{ComputeError, IamError, TokenCacheError};
pub use iam::{IamClient, IamToken, TokenIssuer, create_jwt};
pub use token::{CachedTokenProvider, TokenSource};
