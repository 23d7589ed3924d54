//! Builders for the property payloads accepted by `POST /pages`, and readers
//! for the pages returned by database queries.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

/// Per-object character limit for rich text content.
pub const RICH_TEXT_LIMIT: usize = 2000;

fn text_object(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

fn chunks(content: &str) -> Vec<Value> {
    let characters: Vec<char> = content.chars().collect();
    characters
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| text_object(&chunk.iter().collect::<String>()))
        .collect()
}

pub fn title(content: &str) -> Value {
    json!({ "title": [text_object(content)] })
}

/// Long content is split across several text objects.
pub fn rich_text(content: &str) -> Value {
    json!({ "rich_text": chunks(content) })
}

pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

pub fn relation<'a>(ids: impl IntoIterator<Item = &'a str>) -> Value {
    let ids: Vec<Value> = ids.into_iter().map(|id| json!({ "id": id })).collect();
    json!({ "relation": ids })
}

pub fn date(day: NaiveDate) -> Value {
    json!({ "date": { "start": day.format("%Y-%m-%d").to_string() } })
}

/// Concatenated text of a `title` or `rich_text` property value.
pub fn plain_text(property: &Value) -> Option<String> {
    let items = property
        .get("title")
        .or_else(|| property.get("rich_text"))
        .and_then(Value::as_array)?;

    let text: String = items
        .iter()
        .filter_map(|item| {
            item.get("plain_text")
                .or_else(|| item.get("text").and_then(|text| text.get("content")))
                .and_then(Value::as_str)
        })
        .collect();

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Title text of a page. Without a property name the first property of type
/// `title` is used.
pub fn page_title(page: &Value, property: Option<&str>) -> Option<String> {
    let properties = page.get("properties")?.as_object()?;
    match property {
        Some(name) => properties.get(name).and_then(plain_text),
        None => properties
            .values()
            .filter(|value| value.get("type").and_then(Value::as_str) == Some("title"))
            .find_map(plain_text),
    }
}

/// Customer or project entry offered for linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterRecord {
    pub id: String,
    pub name: String,
}

impl MasterRecord {
    pub fn from_page(page: &Value, title_property: Option<&str>) -> Option<Self> {
        let id = page.get("id").and_then(Value::as_str)?;
        Some(Self {
            id: id.to_string(),
            name: page_title(page, title_property).unwrap_or_default(),
        })
    }
}
