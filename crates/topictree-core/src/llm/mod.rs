//! LLM integration - OpenAI-compatible chat completions
//!
//! This module provides:
//! - HTTP client for chat completions
//! - Request/response types matching the OpenAI API format
//! - Error classification (quota, rate limit, auth, server)

mod client;
mod types;

pub use client::{LlmClient, LlmClientBuilder};
pub use types::{ChatRequest, ChatResponse, Choice, FinishReason, LlmResponse, Message, MessageRole, Usage};
