use std::collections::BTreeMap;
use std::sync::Arc;

use log::{error, warn};
use rocket::tokio;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{Command, Filter, Order, QueryBackend, Row, Table};
use crate::models::blog_post::{BlogPost, BlogPostForm};
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::dashboard::DashboardStats;
use crate::models::faq::{Faq, FaqForm};
use crate::models::from_row;
use crate::models::product::{Product, ProductForm};
use crate::models::settings::{SettingValue, SiteSetting};
use crate::models::testimonial::{Testimonial, TestimonialForm};
use crate::models::{MessageStatus, PostStatus, ProductStatus, VisibilityStatus};

const UNAVAILABLE: &str = "Database unavailable: no backend binding configured";

/// Status shared by soft-deleted products and blog posts.
const DELETED: &str = "deleted";

/// Outcome of a write: `{ success, id? }` or `{ success: false, error }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteResult {
    pub fn ok() -> Self {
        WriteResult {
            success: true,
            id: None,
            error: None,
        }
    }

    pub fn created(id: i64) -> Self {
        WriteResult {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        WriteResult {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

/// Typed CRUD facade over the active query backend.
///
/// Reads fail open (errors are logged and an empty collection or `None`
/// comes back); writes fail closed (`WriteResult { success: false }`).
/// No public method panics or returns a backend error directly.
#[derive(Clone)]
pub struct DatabaseService {
    backend: Option<Arc<dyn QueryBackend>>,
}

impl DatabaseService {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        DatabaseService {
            backend: Some(backend),
        }
    }

    /// A service with no backend: every read is empty, every write fails.
    pub fn unavailable() -> Self {
        DatabaseService { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// "sqlite", "mock", or "unavailable".
    pub fn backend_name(&self) -> &str {
        self.backend
            .as_deref()
            .map(|b| b.name())
            .unwrap_or("unavailable")
    }

    // ── Plumbing ────────────────────────────────────────────────────

    fn backend(&self) -> Result<&Arc<dyn QueryBackend>, String> {
        self.backend.as_ref().ok_or_else(|| UNAVAILABLE.to_string())
    }

    async fn list<T: DeserializeOwned>(&self, what: &str, command: Command) -> Vec<T> {
        let backend = match self.backend() {
            Ok(b) => b,
            Err(e) => {
                warn!("Listing {}: {}", what, e);
                return vec![];
            }
        };
        match backend.all(command).await {
            Ok(result) => result
                .results
                .into_iter()
                .filter_map(|row| decode(what, row))
                .collect(),
            Err(e) => {
                error!("Failed to list {}: {}", what, e);
                vec![]
            }
        }
    }

    async fn find<T: DeserializeOwned>(&self, what: &str, command: Command) -> Option<T> {
        let backend = match self.backend() {
            Ok(b) => b,
            Err(e) => {
                warn!("Reading {}: {}", what, e);
                return None;
            }
        };
        match backend.first(command).await {
            Ok(row) => row.and_then(|r| decode(what, r)),
            Err(e) => {
                error!("Failed to read {}: {}", what, e);
                None
            }
        }
    }

    async fn insert(&self, what: &str, table: Table, row: Row) -> WriteResult {
        let result = async {
            let run = self.backend()?.run(Command::Insert { table, row }).await?;
            run.meta
                .last_row_id
                .ok_or_else(|| "backend did not report an id".to_string())
        }
        .await;
        match result {
            Ok(id) => WriteResult::created(id),
            Err(e) => {
                error!("Failed to create {}: {}", what, e);
                WriteResult::failed(e)
            }
        }
    }

    async fn update(&self, what: &str, table: Table, id: i64, row: Row) -> WriteResult {
        let command = Command::Update {
            table,
            id,
            row,
            filter: Filter::All,
        };
        self.write_one(what, command).await
    }

    /// Update a soft-deletable row. Rows already marked `deleted` are left
    /// alone and reported as not found.
    async fn update_live(&self, what: &str, table: Table, id: i64, row: Row) -> WriteResult {
        let command = Command::Update {
            table,
            id,
            row,
            filter: Filter::status_not(DELETED),
        };
        self.write_one(what, command).await
    }

    async fn remove(&self, what: &str, table: Table, id: i64) -> WriteResult {
        self.write_one(what, Command::Delete { table, id }).await
    }

    /// Run a write that must touch exactly one existing row.
    async fn write_one(&self, what: &str, command: Command) -> WriteResult {
        let id = match &command {
            Command::Update { id, .. } | Command::Delete { id, .. } => *id,
            _ => 0,
        };
        let result = async { self.backend()?.run(command).await }.await;
        match result {
            Ok(run) if run.meta.rows_written > 0 => WriteResult::ok(),
            Ok(_) => WriteResult::failed(format!("{} {} not found", what, id)),
            Err(e) => {
                error!("Failed to write {} {}: {}", what, id, e);
                WriteResult::failed(e)
            }
        }
    }

    async fn count(&self, table: Table, filter: Filter) -> Result<i64, String> {
        let row = self
            .backend()?
            .first(Command::Count { table, filter })
            .await?
            .ok_or_else(|| format!("count on {} returned no row", table))?;
        row.get("count")
            .and_then(Value::as_i64)
            .ok_or_else(|| format!("count on {} returned no number", table))
    }

    // ── Products ────────────────────────────────────────────────────

    /// Products with `status` (default: active), newest first.
    pub async fn get_products(&self, status: Option<ProductStatus>) -> Vec<Product> {
        let status = status.unwrap_or(ProductStatus::Active);
        self.list(
            "products",
            Command::SelectAll {
                table: Table::Products,
                filter: Filter::status(status.as_str()),
                order: Order::NewestFirst,
            },
        )
        .await
    }

    /// Any product by id, including soft-deleted ones.
    pub async fn get_product(&self, id: i64) -> Option<Product> {
        self.find(
            "product",
            Command::SelectOne {
                table: Table::Products,
                id,
            },
        )
        .await
    }

    pub async fn create_product(&self, form: &ProductForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        let row = form.to_row(Some(ProductStatus::Active));
        self.insert("product", Table::Products, row).await
    }

    pub async fn update_product(&self, id: i64, form: &ProductForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        self.update_live("product", Table::Products, id, form.to_row(None))
            .await
    }

    /// Soft delete: the row stays, with status `deleted`.
    pub async fn delete_product(&self, id: i64) -> WriteResult {
        self.update("product", Table::Products, id, status_row(ProductStatus::Deleted.as_str()))
            .await
    }

    // ── Blog posts ──────────────────────────────────────────────────

    /// Posts with `status` (default: published), newest first.
    pub async fn get_blog_posts(&self, status: Option<PostStatus>) -> Vec<BlogPost> {
        let status = status.unwrap_or(PostStatus::Published);
        self.list(
            "blog posts",
            Command::SelectAll {
                table: Table::BlogPosts,
                filter: Filter::status(status.as_str()),
                order: Order::NewestFirst,
            },
        )
        .await
    }

    pub async fn create_blog_post(&self, form: &BlogPostForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        let row = form.to_row(Some(PostStatus::Draft));
        self.insert("blog post", Table::BlogPosts, row).await
    }

    pub async fn update_blog_post(&self, id: i64, form: &BlogPostForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        self.update_live("blog post", Table::BlogPosts, id, form.to_row(None))
            .await
    }

    /// Soft delete: the row stays, with status `deleted`.
    pub async fn delete_blog_post(&self, id: i64) -> WriteResult {
        self.update("blog post", Table::BlogPosts, id, status_row(PostStatus::Deleted.as_str()))
            .await
    }

    // ── FAQs ────────────────────────────────────────────────────────

    /// FAQs with `status` (default: active), by `order_index` then newest.
    pub async fn get_faqs(&self, status: Option<VisibilityStatus>) -> Vec<Faq> {
        let status = status.unwrap_or(VisibilityStatus::Active);
        self.list(
            "faqs",
            Command::SelectAll {
                table: Table::Faqs,
                filter: Filter::status(status.as_str()),
                order: Order::OrderIndexThenNewest,
            },
        )
        .await
    }

    pub async fn create_faq(&self, form: &FaqForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        let row = form.to_row(Some(VisibilityStatus::Active));
        self.insert("faq", Table::Faqs, row).await
    }

    pub async fn update_faq(&self, id: i64, form: &FaqForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        self.update("faq", Table::Faqs, id, form.to_row(None)).await
    }

    /// Hard delete. FAQs have no `deleted` status.
    pub async fn delete_faq(&self, id: i64) -> WriteResult {
        self.remove("faq", Table::Faqs, id).await
    }

    // ── Testimonials ────────────────────────────────────────────────

    /// Testimonials with `status` (default: active), newest first.
    pub async fn get_testimonials(&self, status: Option<VisibilityStatus>) -> Vec<Testimonial> {
        let status = status.unwrap_or(VisibilityStatus::Active);
        self.list(
            "testimonials",
            Command::SelectAll {
                table: Table::Testimonials,
                filter: Filter::status(status.as_str()),
                order: Order::NewestFirst,
            },
        )
        .await
    }

    pub async fn create_testimonial(&self, form: &TestimonialForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        let row = form.to_row(Some(VisibilityStatus::Active));
        self.insert("testimonial", Table::Testimonials, row).await
    }

    pub async fn update_testimonial(&self, id: i64, form: &TestimonialForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        self.update("testimonial", Table::Testimonials, id, form.to_row(None))
            .await
    }

    /// Hard delete. Testimonials have no `deleted` status either.
    pub async fn delete_testimonial(&self, id: i64) -> WriteResult {
        self.remove("testimonial", Table::Testimonials, id).await
    }

    // ── Contact messages ────────────────────────────────────────────

    /// Messages with `status`, or every message when `None`; newest first.
    pub async fn get_contact_messages(&self, status: Option<MessageStatus>) -> Vec<ContactMessage> {
        let filter = match status {
            Some(s) => Filter::status(s.as_str()),
            None => Filter::All,
        };
        self.list(
            "contact messages",
            Command::SelectAll {
                table: Table::ContactMessages,
                filter,
                order: Order::NewestFirst,
            },
        )
        .await
    }

    pub async fn create_contact_message(&self, form: &ContactForm) -> WriteResult {
        if let Err(e) = form.validate() {
            return WriteResult::failed(e);
        }
        self.insert("contact message", Table::ContactMessages, form.to_row())
            .await
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Decoded value for `key`, or `None` when absent or unreadable.
    pub async fn get_setting(&self, key: &str) -> Option<SettingValue> {
        let setting: SiteSetting = self
            .find(
                "setting",
                Command::SelectByKey {
                    table: Table::SiteSettings,
                    column: "key",
                    value: Value::from(key),
                },
            )
            .await?;
        setting.decoded()
    }

    /// Upsert `key`, replacing both value and type in one row write.
    pub async fn set_setting(&self, key: &str, value: &SettingValue) -> WriteResult {
        let key = key.trim();
        if key.is_empty() {
            return WriteResult::failed("setting key is required");
        }
        let mut row = Row::new();
        row.insert("key".into(), Value::from(key));
        row.insert("value".into(), Value::from(value.encode()));
        row.insert("type".into(), Value::from(value.setting_type().as_str()));

        let command = Command::Upsert {
            table: Table::SiteSettings,
            key_column: "key",
            row,
        };
        match async { self.backend()?.run(command).await }.await {
            Ok(_) => WriteResult::ok(),
            Err(e) => {
                error!("Failed to save setting {:?}: {}", key, e);
                WriteResult::failed(e)
            }
        }
    }

    /// Every setting, each row decoded on its own; rows that cannot be
    /// decoded are left out.
    pub async fn get_all_settings(&self) -> BTreeMap<String, SettingValue> {
        let rows: Vec<SiteSetting> = self
            .list(
                "settings",
                Command::SelectAll {
                    table: Table::SiteSettings,
                    filter: Filter::All,
                    order: Order::KeyAsc,
                },
            )
            .await;
        rows.into_iter()
            .filter_map(|s| s.decoded().map(|v| (s.key, v)))
            .collect()
    }

    // ── Dashboard ───────────────────────────────────────────────────

    /// The five dashboard counts, queried concurrently. A failed count is 0.
    pub async fn get_dashboard_stats(&self) -> DashboardStats {
        let (products, blog_posts, faqs, testimonials, unread_messages) = tokio::join!(
            self.count(Table::Products, Filter::status(ProductStatus::Active.as_str())),
            self.count(Table::BlogPosts, Filter::status(PostStatus::Published.as_str())),
            self.count(Table::Faqs, Filter::status(VisibilityStatus::Active.as_str())),
            self.count(Table::Testimonials, Filter::status(VisibilityStatus::Active.as_str())),
            self.count(Table::ContactMessages, Filter::status(MessageStatus::Unread.as_str())),
        );
        DashboardStats {
            products: or_zero("products", products),
            blog_posts: or_zero("blog_posts", blog_posts),
            faqs: or_zero("faqs", faqs),
            testimonials: or_zero("testimonials", testimonials),
            unread_messages: or_zero("unread_messages", unread_messages),
        }
    }
}

fn decode<T: DeserializeOwned>(what: &str, row: Row) -> Option<T> {
    match from_row(row) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Skipping undecodable {} row: {}", what, e);
            None
        }
    }
}

fn status_row(status: &str) -> Row {
    let mut row = Row::new();
    row.insert("status".into(), Value::from(status));
    row
}

fn or_zero(field: &str, count: Result<i64, String>) -> i64 {
    count.unwrap_or_else(|e| {
        warn!("Dashboard count {} failed: {}", field, e);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::QueryResult;
    use serde_json::json;

    /// Wraps the mock and fails selected commands.
    struct FlakyBackend {
        inner: MockBackend,
        failing_table: Option<Table>,
        fail_writes: bool,
    }

    #[rocket::async_trait]
    impl QueryBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn execute(&self, command: Command) -> Result<QueryResult, String> {
            if self.fail_writes && command.is_write() {
                return Err("disk I/O error".to_string());
            }
            if Some(command.table()) == self.failing_table {
                return Err(format!("no such table: {}", command.table()));
            }
            self.inner.execute(command).await
        }
    }

    fn mock_service() -> (DatabaseService, Arc<MockBackend>) {
        let mock = Arc::new(MockBackend::new());
        (DatabaseService::new(mock.clone()), mock)
    }

    fn flaky_service(failing_table: Option<Table>, fail_writes: bool) -> DatabaseService {
        DatabaseService::new(Arc::new(FlakyBackend {
            inner: MockBackend::new(),
            failing_table,
            fail_writes,
        }))
    }

    fn product(title: &str) -> ProductForm {
        ProductForm {
            title: title.to_string(),
            features: vec!["Variable speed".to_string()],
            ..ProductForm::default()
        }
    }

    fn faq(question: &str, order_index: i64) -> FaqForm {
        FaqForm {
            question: question.to_string(),
            answer: "Yes.".to_string(),
            order_index,
            ..FaqForm::default()
        }
    }

    fn testimonial(name: &str) -> TestimonialForm {
        TestimonialForm {
            name: name.to_string(),
            content: "Technician arrived within the hour.".to_string(),
            ..TestimonialForm::default()
        }
    }

    fn message(name: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: "home@example.com".to_string(),
            message: "Need a quote for a new furnace".to_string(),
            ..ContactForm::default()
        }
    }

    // ── Products ────────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_create_then_list_product() {
        let (db, _) = mock_service();
        let mut form = product("X");
        form.status = Some(ProductStatus::Active);
        let created = db.create_product(&form).await;
        assert!(created.success);
        let id = created.id.expect("create returns id");

        let products = db.get_products(Some(ProductStatus::Active)).await;
        assert!(products.iter().any(|p| p.id == id && p.title == "X"));
        assert_eq!(products[0].features, vec!["Variable speed"]);
    }

    #[rocket::async_test]
    async fn test_products_default_to_active_newest_first() {
        let (db, _) = mock_service();
        db.create_product(&product("Old")).await;
        let mut hidden = product("Hidden");
        hidden.status = Some(ProductStatus::Inactive);
        db.create_product(&hidden).await;
        db.create_product(&product("New")).await;

        let titles: Vec<String> = db.get_products(None).await.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
        let inactive = db.get_products(Some(ProductStatus::Inactive)).await;
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].title, "Hidden");
    }

    #[rocket::async_test]
    async fn test_update_product_replaces_fields() {
        let (db, _) = mock_service();
        let id = db.create_product(&product("Boiler")).await.id.unwrap();
        let mut form = product("Combi boiler");
        form.price = Some(2450.0);
        form.features = vec![];
        let updated = db.update_product(id, &form).await;
        assert_eq!(updated, WriteResult::ok());

        let stored = db.get_product(id).await.unwrap();
        assert_eq!(stored.title, "Combi boiler");
        assert_eq!(stored.price, Some(2450.0));
        assert!(stored.features.is_empty());
        // No status in the form: status is left alone
        assert_eq!(stored.status, ProductStatus::Active);
    }

    #[rocket::async_test]
    async fn test_update_missing_product_fails() {
        let (db, _) = mock_service();
        let result = db.update_product(404, &product("Ghost")).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[rocket::async_test]
    async fn test_deleted_product_cannot_be_revived() {
        let (db, _) = mock_service();
        let id = db.create_product(&product("Window unit")).await.id.unwrap();
        assert!(db.delete_product(id).await.success);

        let mut revive = product("Window unit");
        revive.status = Some(ProductStatus::Active);
        let result = db.update_product(id, &revive).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));

        let stored = db.get_product(id).await.unwrap();
        assert_eq!(stored.status, ProductStatus::Deleted);
        assert!(db.get_products(None).await.is_empty());
    }

    #[rocket::async_test]
    async fn test_forms_cannot_set_deleted_status() {
        let (db, mock) = mock_service();
        let mut form = product("Dehumidifier");
        form.status = Some(ProductStatus::Deleted);
        assert!(!db.create_product(&form).await.success);
        assert_eq!(mock.len(Table::Products), 0);

        let id = db.create_product(&product("Dehumidifier")).await.id.unwrap();
        assert!(!db.update_product(id, &form).await.success);
        assert_eq!(db.get_product(id).await.unwrap().status, ProductStatus::Active);

        let post = BlogPostForm {
            title: "Gone".to_string(),
            status: Some(PostStatus::Deleted),
            ..BlogPostForm::default()
        };
        assert!(!db.create_blog_post(&post).await.success);
        assert_eq!(mock.len(Table::BlogPosts), 0);
    }

    #[rocket::async_test]
    async fn test_deleted_blog_post_cannot_be_republished() {
        let (db, _) = mock_service();
        let form = BlogPostForm {
            title: "Summer AC tips".to_string(),
            status: Some(PostStatus::Published),
            ..BlogPostForm::default()
        };
        let id = db.create_blog_post(&form).await.id.unwrap();
        assert!(db.delete_blog_post(id).await.success);
        assert!(!db.update_blog_post(id, &form).await.success);
        assert!(db.get_blog_posts(None).await.is_empty());
        assert_eq!(db.get_blog_posts(Some(PostStatus::Deleted)).await.len(), 1);
    }

    #[rocket::async_test]
    async fn test_soft_delete_product() {
        let (db, _) = mock_service();
        let id = db.create_product(&product("Thermostat")).await.id.unwrap();
        assert!(db.delete_product(id).await.success);

        let stored = db.get_product(id).await.expect("still retrievable by id");
        assert_eq!(stored.status, ProductStatus::Deleted);
        assert!(db.get_products(None).await.is_empty());
        assert_eq!(db.get_products(Some(ProductStatus::Deleted)).await.len(), 1);
    }

    #[rocket::async_test]
    async fn test_invalid_form_never_reaches_backend() {
        let (db, mock) = mock_service();
        let result = db.create_product(&product("")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("title is required"));
        assert_eq!(mock.len(Table::Products), 0);
    }

    #[rocket::async_test]
    async fn test_malformed_stored_features_read_as_empty() {
        let (db, mock) = mock_service();
        let row = json!({ "title": "Legacy unit", "features": "not-json", "status": "active" });
        let id = mock
            .run(Command::Insert {
                table: Table::Products,
                row: row.as_object().unwrap().clone(),
            })
            .await
            .unwrap()
            .meta
            .last_row_id
            .unwrap();
        let stored = db.get_product(id).await.unwrap();
        assert!(stored.features.is_empty());
        assert_eq!(db.get_products(None).await.len(), 1);
    }

    // ── Blog posts ──────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_blog_posts_default_to_published() {
        let (db, _) = mock_service();
        let draft = BlogPostForm {
            title: "Draft".to_string(),
            ..BlogPostForm::default()
        };
        let created = db.create_blog_post(&draft).await;
        assert!(created.success);
        assert!(db.get_blog_posts(None).await.is_empty());

        let published = BlogPostForm {
            title: "Heat pumps explained".to_string(),
            status: Some(PostStatus::Published),
            tags: vec!["heat-pumps".to_string()],
            ..BlogPostForm::default()
        };
        db.create_blog_post(&published).await;
        let posts = db.get_blog_posts(None).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].tags, vec!["heat-pumps"]);
        assert_eq!(db.get_blog_posts(Some(PostStatus::Draft)).await.len(), 1);
    }

    #[rocket::async_test]
    async fn test_soft_delete_blog_post() {
        let (db, mock) = mock_service();
        let form = BlogPostForm {
            title: "Archive me".to_string(),
            status: Some(PostStatus::Published),
            ..BlogPostForm::default()
        };
        let id = db.create_blog_post(&form).await.id.unwrap();
        assert!(db.delete_blog_post(id).await.success);
        assert!(db.get_blog_posts(None).await.is_empty());
        assert_eq!(mock.len(Table::BlogPosts), 1);
        assert_eq!(db.get_blog_posts(Some(PostStatus::Deleted)).await[0].id, id);
    }

    // ── FAQs ────────────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_faqs_order_by_index_not_creation() {
        let (db, _) = mock_service();
        for (q, idx) in [("two", 2), ("zero", 0), ("one", 1)] {
            assert!(db.create_faq(&faq(q, idx)).await.success);
        }
        let faqs = db.get_faqs(Some(VisibilityStatus::Active)).await;
        let order: Vec<i64> = faqs.iter().map(|f| f.order_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(faqs[0].question, "zero");
    }

    #[rocket::async_test]
    async fn test_faq_ties_are_newest_first() {
        let (db, _) = mock_service();
        db.create_faq(&faq("first", 0)).await;
        db.create_faq(&faq("second", 0)).await;
        let faqs = db.get_faqs(None).await;
        assert_eq!(faqs[0].question, "second");
        assert_eq!(faqs[1].question, "first");
    }

    #[rocket::async_test]
    async fn test_hard_delete_faq() {
        let (db, mock) = mock_service();
        let id = db.create_faq(&faq("Gone soon?", 0)).await.id.unwrap();
        let mut inactive = faq("Hidden", 1);
        inactive.status = Some(VisibilityStatus::Inactive);
        db.create_faq(&inactive).await;

        assert!(db.delete_faq(id).await.success);
        for status in [None, Some(VisibilityStatus::Active), Some(VisibilityStatus::Inactive)] {
            assert!(db.get_faqs(status).await.iter().all(|f| f.id != id));
        }
        assert_eq!(mock.len(Table::Faqs), 1);
        // Deleting again finds nothing
        assert!(!db.delete_faq(id).await.success);
    }

    // ── Testimonials ────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_testimonial_lifecycle() {
        let (db, _) = mock_service();
        let id = db.create_testimonial(&testimonial("Priya")).await.id.unwrap();
        let listed = db.get_testimonials(None).await;
        assert_eq!(listed[0].rating, 5);

        let mut form = testimonial("Priya K.");
        form.rating = 4;
        form.status = Some(VisibilityStatus::Inactive);
        assert!(db.update_testimonial(id, &form).await.success);
        assert!(db.get_testimonials(None).await.is_empty());
        let inactive = db.get_testimonials(Some(VisibilityStatus::Inactive)).await;
        assert_eq!(inactive[0].name, "Priya K.");
        assert_eq!(inactive[0].rating, 4);

        assert!(db.delete_testimonial(id).await.success);
        assert!(db.get_testimonials(Some(VisibilityStatus::Inactive)).await.is_empty());
    }

    #[rocket::async_test]
    async fn test_testimonial_rating_validated() {
        let (db, _) = mock_service();
        let mut form = testimonial("Lee");
        form.rating = 9;
        assert!(!db.create_testimonial(&form).await.success);
    }

    // ── Contact messages ────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_contact_messages_created_unread() {
        let (db, _) = mock_service();
        assert!(db.create_contact_message(&message("Ana")).await.success);
        assert!(db.create_contact_message(&message("Ben")).await.success);

        let all = db.get_contact_messages(None).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Ben");
        assert!(all.iter().all(|m| m.status == MessageStatus::Unread));
        assert!(db.get_contact_messages(Some(MessageStatus::Read)).await.is_empty());
    }

    // ── Settings ────────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_setting_missing_is_none() {
        let (db, _) = mock_service();
        assert_eq!(db.get_setting("nope").await, None);
    }

    #[rocket::async_test]
    async fn test_setting_upsert_replaces_value_and_type() {
        let (db, mock) = mock_service();
        assert!(db.set_setting("service_radius", &SettingValue::Number(40.0)).await.success);
        assert!(db
            .set_setting("service_radius", &SettingValue::Text("county-wide".into()))
            .await
            .success);
        assert_eq!(mock.len(Table::SiteSettings), 1);
        assert_eq!(
            db.get_setting("service_radius").await,
            Some(SettingValue::Text("county-wide".into()))
        );
    }

    #[rocket::async_test]
    async fn test_settings_round_trip_through_store() {
        let (db, _) = mock_service();
        let values = [
            ("empty", SettingValue::Text(String::new())),
            ("hours", SettingValue::Json(json!({ "mon": { "open": "08:00" }, "list": [1, 2] }))),
            ("emergency", SettingValue::Bool(true)),
            ("closed", SettingValue::Bool(false)),
            ("zero", SettingValue::Number(0.0)),
            ("negative", SettingValue::Number(-5.0)),
            ("fraction", SettingValue::Number(0.25)),
        ];
        for (key, value) in &values {
            assert!(db.set_setting(key, value).await.success);
        }
        for (key, value) in &values {
            assert_eq!(db.get_setting(key).await.as_ref(), Some(value));
        }
        let all = db.get_all_settings().await;
        assert_eq!(all.len(), values.len());
        assert_eq!(all["emergency"], SettingValue::Bool(true));
    }

    #[rocket::async_test]
    async fn test_all_settings_decodes_rows_independently() {
        let (db, mock) = mock_service();
        db.set_setting("site_name", &SettingValue::Text("Cool Air".into())).await;
        for (key, value, ty) in [("hours", "{broken", "json"), ("radius", "far", "number")] {
            mock.run(Command::Upsert {
                table: Table::SiteSettings,
                key_column: "key",
                row: json!({ "key": key, "value": value, "type": ty })
                    .as_object()
                    .unwrap()
                    .clone(),
            })
            .await
            .unwrap();
        }
        let all = db.get_all_settings().await;
        assert_eq!(all["site_name"], SettingValue::Text("Cool Air".into()));
        assert_eq!(all["hours"], SettingValue::Json(json!({})));
        assert!(!all.contains_key("radius"));
    }

    #[rocket::async_test]
    async fn test_blank_setting_key_rejected() {
        let (db, _) = mock_service();
        assert!(!db.set_setting("  ", &SettingValue::Bool(true)).await.success);
    }

    // ── Dashboard ───────────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_dashboard_counts() {
        let (db, _) = mock_service();
        db.create_product(&product("A")).await;
        db.create_product(&product("B")).await;
        let id = db.create_product(&product("C")).await.id.unwrap();
        db.delete_product(id).await;
        db.create_faq(&faq("q", 0)).await;
        db.create_testimonial(&testimonial("T")).await;
        db.create_contact_message(&message("M")).await;
        db.create_blog_post(&BlogPostForm {
            title: "Draft only".to_string(),
            ..BlogPostForm::default()
        })
        .await;

        let stats = db.get_dashboard_stats().await;
        assert_eq!(
            stats,
            DashboardStats {
                products: 2,
                blog_posts: 0,
                faqs: 1,
                testimonials: 1,
                unread_messages: 1,
            }
        );
    }

    #[rocket::async_test]
    async fn test_dashboard_tolerates_one_failing_count() {
        let db = flaky_service(Some(Table::Faqs), false);
        db.create_product(&product("A")).await;
        db.create_contact_message(&message("M")).await;
        let stats = db.get_dashboard_stats().await;
        assert_eq!(stats.faqs, 0);
        assert_eq!(stats.products, 1);
        assert_eq!(stats.unread_messages, 1);
        let value = serde_json::to_value(stats).unwrap();
        for field in ["products", "blog_posts", "faqs", "testimonials", "unread_messages"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }

    // ── Failure policy ──────────────────────────────────────────────

    #[rocket::async_test]
    async fn test_reads_fail_open_without_backend() {
        let db = DatabaseService::unavailable();
        assert_eq!(db.backend_name(), "unavailable");
        assert!(db.get_products(None).await.is_empty());
        assert!(db.get_product(1).await.is_none());
        assert!(db.get_blog_posts(None).await.is_empty());
        assert!(db.get_faqs(None).await.is_empty());
        assert!(db.get_testimonials(None).await.is_empty());
        assert!(db.get_contact_messages(None).await.is_empty());
        assert!(db.get_setting("site_name").await.is_none());
        assert!(db.get_all_settings().await.is_empty());
        assert_eq!(db.get_dashboard_stats().await, DashboardStats::default());
    }

    #[rocket::async_test]
    async fn test_writes_fail_closed_without_backend() {
        let db = DatabaseService::unavailable();
        let result = db.create_product(&product("X")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(UNAVAILABLE));
        assert!(!db.delete_faq(1).await.success);
        assert!(!db.set_setting("k", &SettingValue::Bool(true)).await.success);
    }

    #[rocket::async_test]
    async fn test_writes_fail_closed_when_run_errors() {
        let db = flaky_service(None, true);
        let results = vec![
            db.create_product(&product("X")).await,
            db.update_product(1, &product("X")).await,
            db.delete_product(1).await,
            db.create_blog_post(&BlogPostForm {
                title: "t".to_string(),
                ..BlogPostForm::default()
            })
            .await,
            db.update_blog_post(1, &BlogPostForm {
                title: "t".to_string(),
                ..BlogPostForm::default()
            })
            .await,
            db.delete_blog_post(1).await,
            db.create_faq(&faq("q", 0)).await,
            db.update_faq(1, &faq("q", 0)).await,
            db.delete_faq(1).await,
            db.create_testimonial(&testimonial("T")).await,
            db.update_testimonial(1, &testimonial("T")).await,
            db.delete_testimonial(1).await,
            db.create_contact_message(&message("M")).await,
            db.set_setting("k", &SettingValue::Number(1.0)).await,
        ];
        for result in results {
            assert!(!result.success);
            assert!(!result.error.unwrap_or_default().is_empty());
        }
    }

    #[rocket::async_test]
    async fn test_reads_fail_open_when_query_errors() {
        let db = flaky_service(Some(Table::Products), false);
        assert!(db.get_products(None).await.is_empty());
        assert!(db.get_product(1).await.is_none());
    }

    #[test]
    fn test_write_result_shape() {
        assert_eq!(
            serde_json::to_value(WriteResult::created(3)).unwrap(),
            json!({ "success": true, "id": 3 })
        );
        assert_eq!(
            serde_json::to_value(WriteResult::failed("boom")).unwrap(),
            json!({ "success": false, "error": "boom" })
        );
    }
}
