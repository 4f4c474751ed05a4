//! Model client traits

use async_trait::async_trait;
use pharmos_protocol::{Message, ModelResponse};

use crate::ProviderError;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ProviderError>;

/// Trait for generation backend clients
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send messages and get a complete response
    async fn chat(&self, messages: &[Message]) -> ModelResult<ModelResponse>;

    /// Get the model identifier
    fn model(&self) -> &str;

    /// Get the provider name
    fn provider(&self) -> &str;
}
