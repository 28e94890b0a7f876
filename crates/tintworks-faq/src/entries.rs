//! The FAQ knowledge base: a fixed, ordered list of question/answer/keyword
//! entries loaded once at startup and never mutated.

use serde::Serialize;

/// One FAQ entry. `question` is unique within the knowledge base; `keywords`
/// is a non-empty set of case-insensitive match tokens.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
    pub keywords: Vec<String>,
}

/// The fixed ordered sequence of entries the matcher scans. Iteration order
/// is the authored order and is part of the tie-break contract.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `n` questions, shown as quick-select shortcuts in the chat
    /// widget.
    pub fn suggested(&self, n: usize) -> Vec<&str> {
        self.entries
            .iter()
            .take(n)
            .map(|e| e.question.as_str())
            .collect()
    }

    /// The builtin window-tinting FAQ set.
    pub fn builtin() -> Self {
        fn entry(question: &str, answer: &str, keywords: &[&str]) -> KnowledgeEntry {
            KnowledgeEntry {
                question: question.into(),
                answer: answer.into(),
                keywords: keywords.iter().map(|k| (*k).into()).collect(),
            }
        }

        Self::new(vec![
            entry(
                "What is window tinting?",
                "Window tinting is the process of applying a thin laminate film to a vehicle's \
                 glass in order to darken it. This film can help reduce heat, glare, and UV \
                 radiation, as well as improve privacy and aesthetics.",
                &["what", "window tinting", "tint", "define"],
            ),
            entry(
                "How much does window tinting cost?",
                "The cost of window tinting can vary depending on the type of film, the size of \
                 your vehicle, and the number of windows being tinted. Our Standard Tint starts \
                 at $200, and Premium Tint starts at $350. For a more precise quote, please \
                 contact us.",
                &["how much", "cost", "price", "pricing", "standard tint", "premium tint"],
            ),
            entry(
                "How long does window tinting last?",
                "High-quality window tint can last for many years, often 10 years or more, \
                 depending on the film quality, climate, and how well it's cared for. We use \
                 durable films designed for longevity.",
                &["how long", "last", "duration", "lifespan", "durability"],
            ),
            entry(
                "Is window tinting legal?",
                "Window tinting laws vary by state and country. Generally, there are \
                 restrictions on how dark the tint can be, especially on the front windshield \
                 and front side windows. We are knowledgeable about local regulations and can \
                 help you choose a legal tint.",
                &["legal", "laws", "regulations", "restrictions", "allowed"],
            ),
            entry(
                "What are the benefits of window tinting?",
                "Benefits include reduced heat and glare, UV protection for your skin and car \
                 interior, increased privacy and security, and enhanced vehicle appearance.",
                &["benefits", "advantages", "why tint", "purpose"],
            ),
            entry(
                "How do I care for my tinted windows?",
                "After tinting, wait a few days before rolling down your windows. Clean tinted \
                 windows with ammonia-free cleaners and a soft cloth or paper towel. Avoid \
                 abrasive materials.",
                &["care", "clean", "maintain", "aftercare", "cleaning"],
            ),
        ])
    }
}
