//! Interpretation Provider Contract
//!
//! Request/response seam between the paid reading flow and whatever
//! generates the interpretation text. The reading handler debits coins
//! first and only then calls `stream_reading`; providers never see a
//! request that has not been paid for.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::reading::ReadingRequest;

/// A chunk of interpretation text from the streaming provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamChunk {
    /// The text delta
    pub delta: String,

    /// Whether this is the final chunk
    pub done: bool,
}

/// Boxed stream of interpretation chunks
pub type InterpretationStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Strategy trait for interpretation backends
#[async_trait]
pub trait InterpretationProvider: Send + Sync {
    /// Stream the interpretation for a validated reading request.
    ///
    /// This is a long-lived operation; callers must have completed any
    /// balance mutation before initiating it.
    async fn stream_reading(&self, request: &ReadingRequest) -> Result<InterpretationStream>;

    /// Cheap reachability probe for health reporting
    async fn health_check(&self) -> Result<bool>;
}
