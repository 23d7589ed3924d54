use super::super::domain::DocumentKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSection {
    pub category: String,
    pub entries: Vec<DocumentEntry>,
}

/// Grouped request text, kept structured until it is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDocument {
    pub kind: DocumentKind,
    pub header: String,
    pub sections: Vec<DocumentSection>,
    pub footer: String,
}

impl RequestDocument {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, category: &str) -> Option<&DocumentSection> {
        self.sections
            .iter()
            .find(|section| section.category == category)
    }

    pub fn render(&self) -> String {
        let mut text = String::with_capacity(256);
        text.push_str(&self.header);
        text.push_str("\n\n");

        for section in &self.sections {
            text.push_str(&section.category);
            text.push_str(":\n");
            for entry in &section.entries {
                text.push_str("  ");
                if let Some(label) = &entry.label {
                    text.push_str(label);
                    text.push_str(": ");
                }
                text.push_str(&entry.value);
                text.push('\n');
            }
            text.push('\n');
        }

        text.push_str(&self.footer);
        text
    }
}

impl fmt::Display for RequestDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
