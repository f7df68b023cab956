//! # statline-llm
//!
//! Chat-model client used by the statline demo.
//!
//! ## Core Concepts
//! - **ChatMessage / Role**: the conversation being sent to the model
//! - **ToolDefinition / ToolCall**: function-calling surface for agents
//! - **LlmProvider**: trait-based seam so callers never depend on a
//!   concrete backend
//! - **OllamaProvider**: the one concrete backend, speaking the native
//!   Ollama `/api/chat` JSON API (non-streaming and NDJSON streaming)

pub mod provider;
pub mod ollama;

pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    ProviderConfig, ProviderError, Role, StreamChunk, StreamReceiver, ToolCall,
    ToolDefinition, Usage, UsageTracker,
};

pub use ollama::OllamaProvider;
