//! Core document types.

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::block::Block;

/// A blog post: ordered blocks plus metadata.
///
/// Deserializes from the platform's post records. The block list may arrive
/// as a bare `blocks` array or inside a `content` envelope
/// (`{ "time": .., "blocks": [..], "version": .. }`), which some backends
/// store as a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedEntity>,
}

/// A record linked to a post (a university, a program, another post).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Identity of one render input: recompilation happens only when this
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentIdentity {
    pub id: String,
    pub fingerprint: u64,
}

impl Document {
    /// Create a document holding only `blocks`.
    pub fn from_blocks(id: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: id.into(),
            blocks,
            ..Self::default()
        }
    }

    /// Returns true if there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Identity used by the compile cache.
    ///
    /// The fingerprint covers the serialized block list and the update
    /// timestamp, so edits under an unchanged id still invalidate.
    pub fn identity(&self) -> DocumentIdentity {
        let mut hasher = DefaultHasher::new();
        serde_json::to_vec(&self.blocks)
            .unwrap_or_default()
            .hash(&mut hasher);
        self.updated_at.hash(&mut hasher);
        DocumentIdentity {
            id: self.id.clone(),
            fingerprint: hasher.finish(),
        }
    }
}

/// One row of the blog index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(default, alias = "_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, alias = "cover_image", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&Document> for PostSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            category: doc.category.clone(),
            rating: doc.rating,
            cover_image: doc.cover_image.clone(),
            created_at: doc.created_at.clone(),
        }
    }
}

/// Wire shape of a post record, normalized into [`Document`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRecord {
    #[serde(default, alias = "_id", deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "cover_image", alias = "image")]
    cover_image: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "created_at")]
    created_at: Option<String>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<String>,
    #[serde(default)]
    blocks: Option<Value>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    related: Vec<RelatedEntity>,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        let blocks = record
            .blocks
            .as_ref()
            .and_then(blocks_from_content)
            .or_else(|| record.content.as_ref().and_then(blocks_from_content))
            .unwrap_or_default();
        Self {
            id: record.id,
            title: record.title,
            cover_image: record.cover_image,
            description: record.description,
            rating: record.rating,
            category: record.category,
            created_at: record.created_at,
            updated_at: record.updated_at,
            blocks,
            related: record.related,
        }
    }
}

fn blocks_from_content(content: &Value) -> Option<Vec<Block>> {
    match content {
        Value::String(raw) => {
            let parsed: Value = serde_json::from_str(raw).ok()?;
            blocks_from_content(&parsed)
        }
        Value::Object(envelope) => envelope
            .get("blocks")
            .and_then(blocks_from_content),
        Value::Array(records) => Some(Block::list_from_values(records)),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
