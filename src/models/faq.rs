use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{require, VisibilityStatus};
use crate::backend::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    #[serde(default)]
    pub answer: String,
    pub category: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    pub status: VisibilityStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqForm {
    pub question: String,
    #[serde(default)]
    pub answer: String,
    pub category: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    pub status: Option<VisibilityStatus>,
}

impl FaqForm {
    pub fn validate(&self) -> Result<(), String> {
        require("question", &self.question)?;
        require("answer", &self.answer)
    }

    pub fn to_row(&self, default_status: Option<VisibilityStatus>) -> Row {
        let mut row = Row::new();
        row.insert("question".into(), Value::from(self.question.trim()));
        row.insert("answer".into(), Value::from(self.answer.as_str()));
        row.insert("category".into(), Value::from(self.category.clone()));
        row.insert("order_index".into(), Value::from(self.order_index));
        if let Some(status) = self.status.or(default_status) {
            row.insert("status".into(), Value::from(status.as_str()));
        }
        row
    }
}
