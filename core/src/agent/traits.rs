use async_trait::async_trait;
use serde_json::Value;

use super::error::AgentError;

/// Concrete (fully resolved) parameters handed to an agent invocation.
pub type ParamMap = serde_json::Map<String, Value>;

/// The one interface every capability provider implements.
///
/// Implementations must be safe to call concurrently from multiple tasks in
/// the same stage, and must surface [`AgentError`] variants rather than
/// panicking or returning opaque failures.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The capability key this provider is registered under.
    fn key(&self) -> &str;

    /// Perform one operation. `mode` is guaranteed (by plan validation) to
    /// be one of the modes declared in the provider's capability.
    async fn invoke(&self, mode: &str, parameters: ParamMap) -> Result<Value, AgentError>;
}
