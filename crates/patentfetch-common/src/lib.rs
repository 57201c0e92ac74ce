//! patentfetch-common: Shared error type and the allowlisted HTTP client used
//! by every patentfetch crate.

pub mod error;
pub mod http;

pub use error::{PatentFetchError, Result};
pub use http::{AllowlistClient, BROWSER_USER_AGENT};
