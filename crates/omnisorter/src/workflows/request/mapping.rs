use serde::{Deserialize, Serialize};

/// Property names used when writing requests and reading master data.
/// Deployments whose databases use other names (`依頼機種`, `顧客`, ...)
/// override individual entries through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub title: String,
    pub model: String,
    pub customer_name: String,
    pub customer_relation: String,
    pub project_relation: String,
    pub requester: String,
    pub quotation: String,
    pub drawing: String,
    pub snapshot: String,
    pub submitted_on: String,
    pub customer_title: String,
    pub project_title: String,
    pub project_customer_relation: String,
}

impl Default for PropertyMapping {
    fn default() -> Self {
        Self {
            title: "依頼名".to_string(),
            model: "OS機種".to_string(),
            customer_name: "顧客名".to_string(),
            customer_relation: "顧客企業".to_string(),
            project_relation: "案件".to_string(),
            requester: "担当者".to_string(),
            quotation: "見積依頼内容".to_string(),
            drawing: "図面依頼内容".to_string(),
            snapshot: "仕様データ".to_string(),
            submitted_on: "依頼日".to_string(),
            customer_title: "会社名".to_string(),
            project_title: "案件名".to_string(),
            project_customer_relation: "顧客企業".to_string(),
        }
    }
}

impl PropertyMapping {
    /// Each entry paired with the suffix of its `NOTION_PROP_*` override.
    pub fn entries_mut(&mut self) -> [(&'static str, &mut String); 13] {
        [
            ("TITLE", &mut self.title),
            ("MODEL", &mut self.model),
            ("CUSTOMER_NAME", &mut self.customer_name),
            ("CUSTOMER_RELATION", &mut self.customer_relation),
            ("PROJECT_RELATION", &mut self.project_relation),
            ("REQUESTER", &mut self.requester),
            ("QUOTATION", &mut self.quotation),
            ("DRAWING", &mut self.drawing),
            ("SNAPSHOT", &mut self.snapshot),
            ("SUBMITTED_ON", &mut self.submitted_on),
            ("CUSTOMER_TITLE", &mut self.customer_title),
            ("PROJECT_TITLE", &mut self.project_title),
            ("PROJECT_CUSTOMER_RELATION", &mut self.project_customer_relation),
        ]
    }

    /// Applies non-blank overrides returned by `lookup` for each suffix.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (suffix, slot) in self.entries_mut() {
            if let Some(value) = lookup(suffix) {
                let value = value.trim();
                if !value.is_empty() {
                    *slot = value.to_string();
                }
            }
        }
    }
}
