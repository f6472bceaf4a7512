use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_text, require, to_json_text, PostStatus};
use crate::backend::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub status: PostStatus,
    #[serde(default, deserialize_with = "json_text")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostForm {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BlogPostForm {
    /// `deleted` is reserved for `delete_blog_post`.
    pub fn validate(&self) -> Result<(), String> {
        require("title", &self.title)?;
        if self.status == Some(PostStatus::Deleted) {
            return Err("status cannot be set to deleted; delete the post instead".to_string());
        }
        Ok(())
    }

    pub fn to_row(&self, default_status: Option<PostStatus>) -> Row {
        let mut row = Row::new();
        row.insert("title".into(), Value::from(self.title.trim()));
        row.insert("content".into(), Value::from(self.content.as_str()));
        row.insert("excerpt".into(), Value::from(self.excerpt.clone()));
        row.insert("featured_image".into(), Value::from(self.featured_image.clone()));
        row.insert("author".into(), Value::from(self.author.clone()));
        row.insert("tags".into(), to_json_text(&self.tags));
        if let Some(status) = self.status.or(default_status) {
            row.insert("status".into(), Value::from(status.as_str()));
        }
        row
    }
}
