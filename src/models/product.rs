use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_text, require, to_json_text, ProductStatus};
use crate::backend::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "json_text")]
    pub all_images: Vec<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(default, deserialize_with = "json_text")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "json_text")]
    pub specifications: Vec<Specification>,
    pub status: ProductStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub all_images: Vec<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
    pub status: Option<ProductStatus>,
}

impl ProductForm {
    /// `deleted` is reserved for `delete_product`.
    pub fn validate(&self) -> Result<(), String> {
        require("title", &self.title)?;
        if self.status == Some(ProductStatus::Deleted) {
            return Err("status cannot be set to deleted; delete the product instead".to_string());
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err("price must be a non-negative number".to_string());
            }
        }
        Ok(())
    }

    /// Column values for insert/update. `status` is written only when
    /// given (or when a default is supplied for creation).
    pub fn to_row(&self, default_status: Option<ProductStatus>) -> Row {
        let mut row = Row::new();
        row.insert("title".into(), Value::from(self.title.trim()));
        row.insert("description".into(), Value::from(self.description.clone()));
        row.insert("price".into(), Value::from(self.price));
        row.insert("image_url".into(), Value::from(self.image_url.clone()));
        row.insert("all_images".into(), to_json_text(&self.all_images));
        row.insert("category".into(), Value::from(self.category.clone()));
        row.insert("brand".into(), Value::from(self.brand.clone()));
        row.insert("model".into(), Value::from(self.model.clone()));
        row.insert("features".into(), to_json_text(&self.features));
        row.insert("specifications".into(), to_json_text(&self.specifications));
        if let Some(status) = self.status.or(default_status) {
            row.insert("status".into(), Value::from(status.as_str()));
        }
        row
    }
}
