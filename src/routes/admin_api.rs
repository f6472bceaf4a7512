use std::collections::BTreeMap;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::Value;

use super::auth::AdminToken;
use super::status_param;
use crate::models::blog_post::{BlogPost, BlogPostForm};
use crate::models::contact::ContactMessage;
use crate::models::dashboard::DashboardStats;
use crate::models::faq::{Faq, FaqForm};
use crate::models::product::{Product, ProductForm};
use crate::models::settings::{SettingType, SettingValue};
use crate::models::testimonial::{Testimonial, TestimonialForm};
use crate::store::{DatabaseService, WriteResult};

// ── Products ───────────────────────────────────────────

/// Any status, including `deleted`. Unknown statuses list nothing.
#[get("/products?<status>")]
pub async fn products(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    status: Option<&str>,
) -> Json<Vec<Product>> {
    match status_param(status) {
        Ok(status) => Json(db.get_products(status).await),
        Err(()) => Json(vec![]),
    }
}

#[get("/products/<id>")]
pub async fn product(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
) -> Option<Json<Product>> {
    db.get_product(id).await.map(Json)
}

#[post("/products", format = "json", data = "<form>")]
pub async fn product_create(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    form: Json<ProductForm>,
) -> Json<WriteResult> {
    Json(db.create_product(&form).await)
}

#[put("/products/<id>", format = "json", data = "<form>")]
pub async fn product_update(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
    form: Json<ProductForm>,
) -> Json<WriteResult> {
    Json(db.update_product(id, &form).await)
}

#[delete("/products/<id>")]
pub async fn product_delete(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
) -> Json<WriteResult> {
    Json(db.delete_product(id).await)
}

// ── Blog posts ─────────────────────────────────────────

#[get("/blog?<status>")]
pub async fn blog_posts(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    status: Option<&str>,
) -> Json<Vec<BlogPost>> {
    match status_param(status) {
        Ok(status) => Json(db.get_blog_posts(status).await),
        Err(()) => Json(vec![]),
    }
}

#[post("/blog", format = "json", data = "<form>")]
pub async fn blog_create(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    form: Json<BlogPostForm>,
) -> Json<WriteResult> {
    Json(db.create_blog_post(&form).await)
}

#[put("/blog/<id>", format = "json", data = "<form>")]
pub async fn blog_update(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
    form: Json<BlogPostForm>,
) -> Json<WriteResult> {
    Json(db.update_blog_post(id, &form).await)
}

#[delete("/blog/<id>")]
pub async fn blog_delete(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
) -> Json<WriteResult> {
    Json(db.delete_blog_post(id).await)
}

// ── FAQs ───────────────────────────────────────────────

#[get("/faqs?<status>")]
pub async fn faqs(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    status: Option<&str>,
) -> Json<Vec<Faq>> {
    match status_param(status) {
        Ok(status) => Json(db.get_faqs(status).await),
        Err(()) => Json(vec![]),
    }
}

#[post("/faqs", format = "json", data = "<form>")]
pub async fn faq_create(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    form: Json<FaqForm>,
) -> Json<WriteResult> {
    Json(db.create_faq(&form).await)
}

#[put("/faqs/<id>", format = "json", data = "<form>")]
pub async fn faq_update(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
    form: Json<FaqForm>,
) -> Json<WriteResult> {
    Json(db.update_faq(id, &form).await)
}

#[delete("/faqs/<id>")]
pub async fn faq_delete(_admin: AdminToken, db: &State<DatabaseService>, id: i64) -> Json<WriteResult> {
    Json(db.delete_faq(id).await)
}

// ── Testimonials ───────────────────────────────────────

#[get("/testimonials?<status>")]
pub async fn testimonials(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    status: Option<&str>,
) -> Json<Vec<Testimonial>> {
    match status_param(status) {
        Ok(status) => Json(db.get_testimonials(status).await),
        Err(()) => Json(vec![]),
    }
}

#[post("/testimonials", format = "json", data = "<form>")]
pub async fn testimonial_create(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    form: Json<TestimonialForm>,
) -> Json<WriteResult> {
    Json(db.create_testimonial(&form).await)
}

#[put("/testimonials/<id>", format = "json", data = "<form>")]
pub async fn testimonial_update(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
    form: Json<TestimonialForm>,
) -> Json<WriteResult> {
    Json(db.update_testimonial(id, &form).await)
}

#[delete("/testimonials/<id>")]
pub async fn testimonial_delete(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    id: i64,
) -> Json<WriteResult> {
    Json(db.delete_testimonial(id).await)
}

// ── Contact messages ───────────────────────────────────

#[get("/messages?<status>")]
pub async fn messages(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    status: Option<&str>,
) -> Json<Vec<ContactMessage>> {
    match status_param(status) {
        Ok(status) => Json(db.get_contact_messages(status).await),
        Err(()) => Json(vec![]),
    }
}

// ── Settings ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    pub value: Value,
}

#[get("/settings")]
pub async fn settings_all(
    _admin: AdminToken,
    db: &State<DatabaseService>,
) -> Json<BTreeMap<String, SettingValue>> {
    Json(db.get_all_settings().await)
}

#[get("/settings/<key>")]
pub async fn setting_get(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    key: &str,
) -> Option<Json<SettingValue>> {
    db.get_setting(key).await.map(Json)
}

#[put("/settings/<key>", format = "json", data = "<body>")]
pub async fn setting_put(
    _admin: AdminToken,
    db: &State<DatabaseService>,
    key: &str,
    body: Json<SettingUpdate>,
) -> Json<WriteResult> {
    let body = body.into_inner();
    match SettingValue::from_parts(body.setting_type, body.value) {
        Ok(value) => Json(db.set_setting(key, &value).await),
        Err(e) => Json(WriteResult::failed(e)),
    }
}

// ── Dashboard ──────────────────────────────────────────

#[get("/dashboard")]
pub async fn dashboard(_admin: AdminToken, db: &State<DatabaseService>) -> Json<DashboardStats> {
    Json(db.get_dashboard_stats().await)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        products,
        product,
        product_create,
        product_update,
        product_delete,
        blog_posts,
        blog_create,
        blog_update,
        blog_delete,
        faqs,
        faq_create,
        faq_update,
        faq_delete,
        testimonials,
        testimonial_create,
        testimonial_update,
        testimonial_delete,
        messages,
        settings_all,
        setting_get,
        setting_put,
        dashboard,
    ]
}
