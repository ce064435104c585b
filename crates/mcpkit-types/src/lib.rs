//! Core MCP value types.
//!
//! This crate is the single source of truth for the value types shared
//! across the rest of the workspace: the identifiers used on the JSON-RPC
//! wire, the content blocks returned by tools/resources/prompts, and the
//! definitions of the four registered-entity kinds (tool, resource, prompt,
//! root).

pub mod content;
pub mod core;
pub mod definitions;

pub use content::{Content, ContentBlock, PromptMessage, PromptResult};
pub use core::{RequestId, Timestamp};
pub use definitions::{Prompt, PromptArgument, Resource, Root, Tool, ToolAnnotations};
