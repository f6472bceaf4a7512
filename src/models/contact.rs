use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{require, MessageStatus};
use crate::backend::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub created_at: String,
}

/// Submitted from the public contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        require("message", &self.message)?;
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err("a valid email is required".to_string()),
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), Value::from(self.name.trim()));
        row.insert("email".into(), Value::from(self.email.trim()));
        row.insert("phone".into(), Value::from(self.phone.clone()));
        row.insert("subject".into(), Value::from(self.subject.clone()));
        row.insert("message".into(), Value::from(self.message.as_str()));
        row.insert("status".into(), Value::from(MessageStatus::Unread.as_str()));
        row
    }
}
