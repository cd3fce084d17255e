//! Prompt template rendering.
//!
//! Retrieved records and the question are inserted verbatim. Nothing is
//! escaped, so session text and user input can both steer the model; the
//! model has no tools, which bounds what that can achieve.

use confassist_retrieval::SessionRecord;
use serde_json::Value;

use crate::error::{ChatBotError, Result};

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// The conference assistant persona.
pub const DEFAULT_TEMPLATE: &str = "\
You are a helpful assistant helping attendees at Nebraska.Code(), a software development conference, make the most of their conference by answering questions about sessions and helping them find the best sessions to attend based on their interests. Your answers should be conversational - do not simply respond with the verbatim session data, but do make sure to include relevant information such as the room and times of the sessions. If there is more than one session that matches their query, feel free to reference them all. A bulleted list is acceptable in the output.
Here are some sessions that appear relevant to the user's question. Use these as you see fit to help answer the user's question:

{context}

Question: {question}
Answer: ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A template with `{context}` and `{question}` slots, parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `text`. Both slots must appear at least once.
    pub fn new(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let next = [
                (rest.find(CONTEXT_SLOT), CONTEXT_SLOT, Segment::Context),
                (rest.find(QUESTION_SLOT), QUESTION_SLOT, Segment::Question),
            ]
            .into_iter()
            .filter_map(|(pos, slot, segment)| pos.map(|pos| (pos, slot, segment)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, slot, segment)) => {
                    if pos > 0 {
                        segments.push(Segment::Literal(rest[..pos].to_string()));
                    }
                    segments.push(segment);
                    rest = &rest[pos + slot.len()..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        for (segment, slot) in [
            (Segment::Context, CONTEXT_SLOT),
            (Segment::Question, QUESTION_SLOT),
        ] {
            if !segments.contains(&segment) {
                return Err(ChatBotError::InvalidTemplate(format!("missing {slot} slot")));
            }
        }

        Ok(Self { segments })
    }

    /// Substitute the slots. Values are never scanned for further slots.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut prompt = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Context => prompt.push_str(context),
                Segment::Question => prompt.push_str(question),
            }
        }
        prompt
    }
}

/// Serialise retrieved sessions into the `{context}` value.
///
/// One block per record: the description, then a `key: value` line for each
/// metadata entry in key order. Blocks are separated by a blank line.
pub fn format_context(records: &[SessionRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let mut block = record.content.trim_end().to_string();
            for (key, value) in &record.metadata {
                block.push('\n');
                block.push_str(key);
                block.push_str(": ");
                match value {
                    Value::String(s) => block.push_str(s),
                    other => block.push_str(&other.to_string()),
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
