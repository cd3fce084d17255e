//! Conference session records.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::info;

use crate::error::{Result, RetrievalError};

/// A conference session as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier within the index.
    pub id: String,

    /// Free-text description of the session.
    pub content: String,

    /// Extra fields such as `room`, `time` or `speaker`.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SessionRecord {
    /// Create a record without metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A retrieved record and its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: SessionRecord,
    pub score: f32,
}

/// One element of a sessions input file.
#[derive(Debug, Deserialize)]
struct SessionInput {
    id: Option<String>,
    #[serde(alias = "page_content", alias = "description")]
    content: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Read session records from a JSON array.
///
/// Each element needs a `content` (or `page_content`/`description`) string
/// and may carry an `id` and a `metadata` object. Missing ids default to the
/// element's position.
pub async fn load_sessions(path: impl AsRef<Path>) -> Result<Vec<SessionRecord>> {
    let path = path.as_ref();
    let raw = fs::read(path).await?;
    let records = parse_sessions(&raw)?;
    info!("Read {} sessions from {}", records.len(), path.display());
    Ok(records)
}

fn parse_sessions(raw: &[u8]) -> Result<Vec<SessionRecord>> {
    let inputs: Vec<SessionInput> = serde_json::from_slice(raw)?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(position, input)| {
            if input.content.trim().is_empty() {
                return Err(RetrievalError::InvalidSessions(format!(
                    "session at position {position} has empty content"
                )));
            }
            Ok(SessionRecord {
                id: input.id.unwrap_or_else(|| position.to_string()),
                content: input.content,
                metadata: input.metadata,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_sessions_defaults_ids() {
        let raw = br#"[
            {"content": "Intro to property testing", "metadata": {"room": "A", "time": "9:00"}},
            {"id": "kw", "page_content": "Keynote"}
        ]"#;

        let records = parse_sessions(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "0");
        assert_eq!(records[0].metadata["room"], "A");
        assert_eq!(records[0].metadata["time"], "9:00");
        assert_eq!(records[1].id, "kw");
        assert_eq!(records[1].content, "Keynote");
        assert!(records[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_sessions_rejects_empty_content() {
        let raw = br#"[{"content": "   "}]"#;
        assert!(matches!(
            parse_sessions(raw),
            Err(RetrievalError::InvalidSessions(_))
        ));
    }

    #[tokio::test]
    async fn test_load_sessions_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        tokio::fs::write(&path, r#"[{"content": "Rust in production"}]"#)
            .await
            .unwrap();

        let records = load_sessions(&path).await.unwrap();
        assert_eq!(records, vec![SessionRecord::new("0", "Rust in production")]);
    }
}
