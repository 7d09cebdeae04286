//! Content blocks and their typed payloads.
//!
//! Blocks arrive as `{ "type": ..., "data": {...} }` objects from the block
//! editor. The raw JSON payload is kept as-is and decoded lazily into a
//! [`BlockContent`] variant. Decoding never fails: missing or mistyped
//! fields fall back to defaults so one bad block cannot take down a render.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of authored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Editor-assigned block id, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Type discriminator (`header`, `list`, `embed`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Type-specific payload
    #[serde(default)]
    pub data: Value,
}

impl Block {
    /// Create a block from a type tag and payload.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            data,
        }
    }

    /// Build a block from one raw record, tolerating mistyped fields.
    ///
    /// A numeric `id` is stringified; a missing or non-string `type` becomes
    /// an empty tag, which renders as an unknown block. Returns `None` for
    /// records that are not objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        Some(Self {
            id,
            kind: fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            data: fields.get("data").cloned().unwrap_or_default(),
        })
    }

    /// Decode a raw block list, skipping entries that are not objects.
    pub fn list_from_values(values: &[Value]) -> Vec<Self> {
        values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let block = Self::from_value(value);
                if block.is_none() {
                    tracing::warn!(index, "skipping block record that is not an object");
                }
                block
            })
            .collect()
    }

    /// Decode the payload according to the block type.
    pub fn content(&self) -> BlockContent {
        let data = &self.data;
        match self.kind.as_str() {
            "header" | "heading" => BlockContent::Header(HeaderBlock::decode(data)),
            "paragraph" => BlockContent::Paragraph(ParagraphBlock {
                text: text_field(data, "text"),
            }),
            "list" | "nestedList" | "nestedlist" => BlockContent::List(ListBlock::decode(data)),
            "embed" => BlockContent::Embed(EmbedBlock::decode(data)),
            "table" => BlockContent::Table(TableBlock::decode(data)),
            "delimiter" => BlockContent::Delimiter,
            "quote" => BlockContent::Quote(QuoteBlock {
                text: text_field(data, "text"),
                caption: opt_text_field(data, "caption"),
            }),
            "code" => BlockContent::Code(CodeBlock {
                code: text_field(data, "code"),
                language: opt_text_field(data, "language")
                    .or_else(|| opt_text_field(data, "languageCode")),
            }),
            "image" | "simpleImage" => BlockContent::Image(ImageBlock::decode(data)),
            "checklist" => BlockContent::Checklist(ChecklistBlock::decode(data)),
            "raw" => BlockContent::Raw(RawBlock {
                html: text_field(data, "html"),
            }),
            other => BlockContent::Unknown(other.to_string()),
        }
    }
}

/// Typed view of a block payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Header(HeaderBlock),
    Paragraph(ParagraphBlock),
    List(ListBlock),
    Embed(EmbedBlock),
    Table(TableBlock),
    Delimiter,
    Quote(QuoteBlock),
    Code(CodeBlock),
    Image(ImageBlock),
    Checklist(ChecklistBlock),
    Raw(RawBlock),
    /// A type this version does not know how to render
    Unknown(String),
}

/// Heading level used when the payload carries none.
pub const DEFAULT_HEADER_LEVEL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Inline markup as authored
    pub text: String,
    /// Heading level, always in `1..=6`
    pub level: u8,
}

impl HeaderBlock {
    fn decode(data: &Value) -> Self {
        let level = match data.get("level") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .map_or(DEFAULT_HEADER_LEVEL, |level| {
            u8::try_from(level.clamp(1, 6)).unwrap_or(DEFAULT_HEADER_LEVEL)
        });
        Self {
            text: text_field(data, "text"),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBlock {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Inline markup as authored
    pub content: String,
    /// Nested items (nested-list editor plugin)
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlock {
    pub style: ListStyle,
    pub items: Vec<ListItem>,
}

impl ListBlock {
    fn decode(data: &Value) -> Self {
        let style = match data.get("style").and_then(Value::as_str) {
            Some("ordered") => ListStyle::Ordered,
            _ => ListStyle::Unordered,
        };
        Self {
            style,
            items: decode_list_items(data.get("items")),
        }
    }
}

fn decode_list_items(items: Option<&Value>) -> Vec<ListItem> {
    let Some(Value::Array(items)) = items else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(ListItem {
                content: text.clone(),
                items: Vec::new(),
            }),
            Value::Object(_) => Some(ListItem {
                content: opt_text_field(item, "content")
                    .or_else(|| opt_text_field(item, "text"))
                    .unwrap_or_default(),
                items: decode_list_items(item.get("items")),
            }),
            Value::Number(n) => Some(ListItem {
                content: n.to_string(),
                items: Vec::new(),
            }),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbedBlock {
    /// Service name reported by the editor (`youtube`, `vimeo`, ...)
    pub service: Option<String>,
    /// Original URL the author pasted
    pub source: Option<String>,
    /// Player URL suitable for an iframe
    pub embed: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
}

impl EmbedBlock {
    fn decode(data: &Value) -> Self {
        Self {
            service: opt_text_field(data, "service"),
            source: opt_text_field(data, "source"),
            embed: opt_text_field(data, "embed"),
            width: dimension(data, "width"),
            height: dimension(data, "height"),
            caption: opt_text_field(data, "caption"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBlock {
    /// Cell markup, row-major, in authored order
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    fn decode(data: &Value) -> Self {
        let rows = data
            .get("content")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_array)
                    .map(|cells| cells.iter().map(cell_text).collect())
                    .collect()
            })
            .unwrap_or_default();
        Self { rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteBlock {
    pub text: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub code: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageBlock {
    pub url: Option<String>,
    pub caption: Option<String>,
    pub with_border: bool,
    pub stretched: bool,
    pub with_background: bool,
}

impl ImageBlock {
    fn decode(data: &Value) -> Self {
        let url = data
            .get("file")
            .and_then(|file| opt_text_field(file, "url"))
            .or_else(|| opt_text_field(data, "url"));
        Self {
            url,
            caption: opt_text_field(data, "caption"),
            with_border: flag(data, "withBorder"),
            stretched: flag(data, "stretched"),
            with_background: flag(data, "withBackground"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistBlock {
    pub items: Vec<ChecklistItem>,
}

impl ChecklistBlock {
    fn decode(data: &Value) -> Self {
        let items = data
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| ChecklistItem {
                        text: text_field(item, "text"),
                        checked: flag(item, "checked"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { items }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub html: String,
}

fn text_field(data: &Value, key: &str) -> String {
    opt_text_field(data, key).unwrap_or_default()
}

/// A string field, treating empty strings as absent. Numbers are accepted
/// and stringified since some editor plugins emit them for text.
fn opt_text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn dimension(data: &Value, key: &str) -> Option<u32> {
    match data.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|&v| v > 0)
}

fn flag(data: &Value, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_tolerates_mistyped_fields() {
        let block = Block::from_value(&json!({ "id": 7, "type": "paragraph", "data": { "text": "x" } }))
            .unwrap();
        assert_eq!(block.id.as_deref(), Some("7"));
        assert_eq!(block.kind, "paragraph");

        let block = Block::from_value(&json!({ "type": null, "data": 3 })).unwrap();
        assert_eq!(block.content(), BlockContent::Unknown(String::new()));
        assert!(Block::from_value(&json!("header")).is_none());
    }

    #[test]
    fn test_list_from_values_skips_non_objects() {
        let blocks = Block::list_from_values(&[
            json!({ "type": "delimiter" }),
            json!(null),
            json!([1, 2]),
            json!({ "type": "paragraph", "data": { "text": "y" } }),
        ]);
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, ["delimiter", "paragraph"]);
    }

    #[test]
    fn test_header_level_defaults_and_clamps() {
        let block = Block::new("header", json!({ "text": "Intro" }));
        assert_eq!(
            block.content(),
            BlockContent::Header(HeaderBlock {
                text: "Intro".to_string(),
                level: DEFAULT_HEADER_LEVEL,
            })
        );

        let block = Block::new("header", json!({ "text": "Deep", "level": 9 }));
        let BlockContent::Header(header) = block.content() else {
            panic!("expected header");
        };
        assert_eq!(header.level, 6);
    }

    #[test]
    fn test_header_level_accepts_string() {
        let block = Block::new("header", json!({ "text": "x", "level": "3" }));
        let BlockContent::Header(header) = block.content() else {
            panic!("expected header");
        };
        assert_eq!(header.level, 3);
    }

    #[test]
    fn test_header_missing_text_is_empty_not_error() {
        let block = Block::new("header", json!({ "level": 2 }));
        let BlockContent::Header(header) = block.content() else {
            panic!("expected header");
        };
        assert!(header.text.is_empty());
    }

    #[test]
    fn test_list_accepts_strings_and_nested_objects() {
        let block = Block::new(
            "list",
            json!({
                "style": "ordered",
                "items": [
                    "one",
                    { "content": "two", "items": [{ "content": "two.a", "items": [] }] },
                    null
                ]
            }),
        );
        let BlockContent::List(list) = block.content() else {
            panic!("expected list");
        };
        assert_eq!(list.style, ListStyle::Ordered);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].items[0].content, "two.a");
    }

    #[test]
    fn test_table_keeps_row_and_cell_order() {
        let block = Block::new(
            "table",
            json!({ "content": [["Name", "Year"], ["MIT", 1861]] }),
        );
        let BlockContent::Table(table) = block.content() else {
            panic!("expected table");
        };
        assert_eq!(
            table.rows,
            vec![
                vec!["Name".to_string(), "Year".to_string()],
                vec!["MIT".to_string(), "1861".to_string()],
            ]
        );
    }

    #[test]
    fn test_image_url_from_file_or_flat_field() {
        let nested = Block::new("image", json!({ "file": { "url": "a.png" } }));
        let flat = Block::new("simpleImage", json!({ "url": "b.png" }));
        assert!(matches!(nested.content(), BlockContent::Image(ImageBlock { url: Some(u), .. }) if u == "a.png"));
        assert!(matches!(flat.content(), BlockContent::Image(ImageBlock { url: Some(u), .. }) if u == "b.png"));
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let block = Block::new("poll", json!({ "question": "?" }));
        assert_eq!(block.content(), BlockContent::Unknown("poll".to_string()));
    }

    #[test]
    fn test_block_without_type_deserializes_as_unknown() {
        let block: Block = serde_json::from_value(json!({ "data": {} })).unwrap();
        assert_eq!(block.content(), BlockContent::Unknown(String::new()));
    }

    #[test]
    fn test_payload_of_wrong_shape_degrades() {
        let block = Block::new("embed", json!("not an object"));
        assert_eq!(block.content(), BlockContent::Embed(EmbedBlock::default()));
    }
}
