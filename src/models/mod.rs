//! Data models module
//!
//! Defines request and response data structures for the Ollama HTTP API

pub mod ollama;

pub use ollama::{GenerateOptions, GenerateRequest, GenerateResponse, ModelInfo, TagsResponse};
