//! The FAQ matching routine.
//!
//! Scoring is deliberately simple: a keyword counts when it appears anywhere
//! in the lowercased query, substring containment rather than word matching,
//! and no normalization beyond case folding. The tie-break is part of the
//! contract — equal positive scores accumulate answers in knowledge-base
//! order, so the result is deterministic but order-dependent.

use crate::entries::KnowledgeBase;

/// Result of one query against the knowledge base. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The accumulated best answer, or `None` when nothing scored.
    pub answer: Option<String>,
    /// The best score reached. Zero means fallback.
    pub score: u32,
}

impl MatchResult {
    pub fn fallback() -> Self {
        Self {
            answer: None,
            score: 0,
        }
    }
}

/// Score `query` against every entry and return the best answer.
///
/// Total over its domain: empty queries, queries with no keyword hits, and
/// empty knowledge bases all yield the fallback rather than an error.
pub fn match_query(query: &str, kb: &KnowledgeBase) -> MatchResult {
    let lowered = query.to_lowercase();

    let mut best_score: u32 = 0;
    let mut answer: Option<String> = None;

    for entry in kb.entries() {
        let score = entry
            .keywords
            .iter()
            .filter(|k| lowered.contains(&k.to_lowercase()))
            .count() as u32;

        if score > best_score {
            best_score = score;
            answer = Some(entry.answer.clone());
        } else if score > 0 && score == best_score {
            // Equal positive score: append in knowledge-base order, unless
            // this exact answer text is already part of the accumulation.
            if let Some(acc) = answer.as_mut() {
                if !acc.contains(&entry.answer) {
                    acc.push_str("\n\n");
                    acc.push_str(&entry.answer);
                }
            }
        }
    }

    if best_score > 0 {
        MatchResult {
            answer,
            score: best_score,
        }
    } else {
        MatchResult::fallback()
    }
}
