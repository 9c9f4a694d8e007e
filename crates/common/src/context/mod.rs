//! Context fusion
//!
//! Turns a question into a grounded answer:
//! - Conversation-aware query enrichment
//! - Nearest-chunk retrieval from the active index
//! - Prompt assembly and generation
//! - Source previews for citation

mod engine;
mod history;
mod prompt;
mod sources;

pub use engine::{IndexOutcome, QueryEngine, RagService};
pub use history::{enrich_query, truncate_chars, ConversationMessage, HISTORY_MESSAGE_CHARS, HISTORY_WINDOW};
pub use prompt::build_prompt;
pub use sources::{SearchResult, SourceNode, ELLIPSIS, SOURCE_PREVIEW_CHARS};
