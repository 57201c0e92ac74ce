//! patentfetch-retrieval: Patent PDF retrieval pipeline.
//! - Identifier normalisation
//! - Detail page fetch + PDF link extraction
//! - Streaming, atomic PDF download
//! - Sequential batch orchestration with pacing and cancellation
//! - Failure recording and progress events

pub mod download;
pub mod error;
pub mod events;
pub mod input;
pub mod models;
pub mod normalise;
pub mod pacing;
pub mod pipeline;
pub mod recorder;
pub mod sources;

pub use error::{BatchError, InputError, RetrievalError};
pub use models::{BatchSummary, FailureKind, FailureRecord, PatentIdentifier, RetrievalResult};
pub use pipeline::{CancelFlag, RetrievalPipeline};
