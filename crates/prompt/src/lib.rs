//! Prompt system for Docent.
//!
//! - Built-in and YAML-defined prompt definitions
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, RAG_ANSWER_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
