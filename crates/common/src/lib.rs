pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod logging;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::fingerprint::Fingerprint;
