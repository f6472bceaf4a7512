use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{require, VisibilityStatus};
use crate::backend::Row;

pub const DEFAULT_RATING: i64 = 5;

fn default_rating() -> i64 {
    DEFAULT_RATING
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_rating")]
    pub rating: i64,
    pub avatar_url: Option<String>,
    pub status: VisibilityStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialForm {
    pub name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_rating")]
    pub rating: i64,
    pub avatar_url: Option<String>,
    pub status: Option<VisibilityStatus>,
}

impl Default for TestimonialForm {
    fn default() -> Self {
        TestimonialForm {
            name: String::new(),
            company: None,
            position: None,
            content: String::new(),
            rating: DEFAULT_RATING,
            avatar_url: None,
            status: None,
        }
    }
}

impl TestimonialForm {
    pub fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        require("content", &self.content)?;
        if !(1..=5).contains(&self.rating) {
            return Err("rating must be between 1 and 5".to_string());
        }
        Ok(())
    }

    pub fn to_row(&self, default_status: Option<VisibilityStatus>) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), Value::from(self.name.trim()));
        row.insert("company".into(), Value::from(self.company.clone()));
        row.insert("position".into(), Value::from(self.position.clone()));
        row.insert("content".into(), Value::from(self.content.as_str()));
        row.insert("rating".into(), Value::from(self.rating));
        row.insert("avatar_url".into(), Value::from(self.avatar_url.clone()));
        if let Some(status) = self.status.or(default_status) {
            row.insert("status".into(), Value::from(status.as_str()));
        }
        row
    }
}
