//! Per-session chat state: the append-only transcript and the widget
//! open/closed toggle that wraps the matcher.

use std::sync::Arc;

use serde::Serialize;

use crate::entries::KnowledgeBase;
use crate::matcher::match_query;

/// Greeting seeded as the first bot turn of every session.
pub const GREETING: &str = "Hello! How can I help you today? Ask a question or choose one below.";

/// Reply used when no entry scores above zero.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't find an answer to that. Please try rephrasing or ask another question.";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub text: String,
    pub sender: Sender,
}

/// Widget visibility. Toggling has no effect on the transcript or the
/// knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Idle,
    Active,
}

/// One chat session: an exclusive, growing transcript over a shared
/// read-only knowledge base. Submitting a query is synchronous and cannot
/// fail — there is no I/O anywhere on this path.
#[derive(Debug)]
pub struct ChatSession {
    kb: Arc<KnowledgeBase>,
    transcript: Vec<ConversationTurn>,
    state: WidgetState,
}

impl ChatSession {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            transcript: vec![ConversationTurn {
                text: GREETING.into(),
                sender: Sender::Bot,
            }],
            state: WidgetState::Idle,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    /// Collapse or expand the widget.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            WidgetState::Idle => WidgetState::Active,
            WidgetState::Active => WidgetState::Idle,
        };
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Submit a typed query: trim it, ignore it entirely if blank, otherwise
    /// append the user turn, run the matcher, append and return the bot
    /// reply.
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        Some(self.run(query))
    }

    /// Submit a quick-select question. Shortcut text is authored, so it is
    /// passed through verbatim rather than trimmed.
    pub fn submit_suggestion(&mut self, question: &str) -> String {
        self.run(question)
    }

    fn run(&mut self, query: &str) -> String {
        self.transcript.push(ConversationTurn {
            text: query.into(),
            sender: Sender::User,
        });

        let result = match_query(query, &self.kb);
        let reply = result.answer.unwrap_or_else(|| FALLBACK_REPLY.into());

        self.transcript.push(ConversationTurn {
            text: reply.clone(),
            sender: Sender::Bot,
        });
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new(Arc::new(KnowledgeBase::builtin()))
    }

    #[test]
    fn test_new_session_seeds_greeting() {
        let s = session();
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript()[0].sender, Sender::Bot);
        assert_eq!(s.transcript()[0].text, GREETING);
        assert_eq!(s.state(), WidgetState::Idle);
    }

    #[test]
    fn test_toggle_does_not_touch_transcript() {
        let mut s = session();
        s.toggle();
        assert_eq!(s.state(), WidgetState::Active);
        s.toggle();
        assert_eq!(s.state(), WidgetState::Idle);
        assert_eq!(s.transcript().len(), 1);
    }

    #[test]
    fn test_submit_appends_user_then_bot_turn() {
        let mut s = session();
        let reply = s.submit("is window tinting legal?").unwrap();
        assert_eq!(s.transcript().len(), 3);
        assert_eq!(s.transcript()[1].sender, Sender::User);
        assert_eq!(s.transcript()[1].text, "is window tinting legal?");
        assert_eq!(s.transcript()[2].sender, Sender::Bot);
        assert_eq!(s.transcript()[2].text, reply);
        assert!(reply.contains("laws vary"));
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut s = session();
        assert!(s.submit("").is_none());
        assert!(s.submit("   ").is_none());
        assert_eq!(s.transcript().len(), 1);
    }

    #[test]
    fn test_typed_submit_is_trimmed() {
        let mut s = session();
        s.submit("  tint  ").unwrap();
        assert_eq!(s.transcript()[1].text, "tint");
    }

    #[test]
    fn test_unmatched_query_gets_fallback_reply() {
        let mut s = session();
        let reply = s.submit("xyzzy").unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[test]
    fn test_quick_select_answers_its_own_faq() {
        let kb = Arc::new(KnowledgeBase::builtin());
        let mut s = ChatSession::new(kb.clone());
        for question in kb.suggested(3) {
            let reply = s.submit_suggestion(question);
            assert_ne!(reply, FALLBACK_REPLY, "no answer for '{question}'");
        }
    }

    #[test]
    fn test_transcript_grows_monotonically() {
        let mut s = session();
        s.submit("cost").unwrap();
        s.submit("legal").unwrap();
        let texts: Vec<_> = s.transcript().iter().map(|t| t.text.clone()).collect();
        s.submit("care").unwrap();
        // Earlier turns are untouched by later submissions
        assert_eq!(
            texts,
            s.transcript()[..5]
                .iter()
                .map(|t| t.text.clone())
                .collect::<Vec<_>>()
        );
    }
}
