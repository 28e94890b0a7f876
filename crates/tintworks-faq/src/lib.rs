//! # Tintworks FAQ
//!
//! Keyword-matching FAQ engine for the storefront chat widget.
//! No embeddings, no search index, no persistence — the knowledge base is a
//! fixed in-source list and matching is a linear scan with integer scores.
//!
//! ## How it works
//! ```text
//! User: "is tint legal in my state?"
//!   ↓
//! match_query(text, knowledge_base)
//!   ↓ lowercase substring containment, count per entry
//! Best-scoring answer (ties accumulate in knowledge-base order)
//!   ↓
//! Appended to the session transcript as a bot turn
//! ```
//!
//! Matching is a pure function of its inputs: identical query + knowledge
//! base always yields the identical result, and the scan performs no I/O.

pub mod entries;
pub mod matcher;
pub mod session;

pub use entries::{KnowledgeBase, KnowledgeEntry};
pub use matcher::{MatchResult, match_query};
pub use session::{ChatSession, ConversationTurn, Sender, WidgetState};
