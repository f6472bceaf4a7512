use std::collections::BTreeMap;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::models::blog_post::BlogPost;
use crate::models::contact::ContactForm;
use crate::models::faq::Faq;
use crate::models::product::Product;
use crate::models::settings::SettingValue;
use crate::models::testimonial::Testimonial;
use crate::models::{PostStatus, ProductStatus, VisibilityStatus};
use crate::store::{DatabaseService, WriteResult};

// ── Catalogue ──────────────────────────────────────────
//
// Public lists show only visible rows; other statuses are listed through
// the admin API.

#[get("/products")]
pub async fn products(db: &State<DatabaseService>) -> Json<Vec<Product>> {
    Json(db.get_products(Some(ProductStatus::Active)).await)
}

#[get("/products/<id>")]
pub async fn product(db: &State<DatabaseService>, id: i64) -> Option<Json<Product>> {
    db.get_product(id)
        .await
        .filter(|p| p.status == ProductStatus::Active)
        .map(Json)
}

// ── Content ────────────────────────────────────────────

#[get("/blog")]
pub async fn blog_posts(db: &State<DatabaseService>) -> Json<Vec<BlogPost>> {
    Json(db.get_blog_posts(Some(PostStatus::Published)).await)
}

#[get("/faqs")]
pub async fn faqs(db: &State<DatabaseService>) -> Json<Vec<Faq>> {
    Json(db.get_faqs(Some(VisibilityStatus::Active)).await)
}

#[get("/testimonials")]
pub async fn testimonials(db: &State<DatabaseService>) -> Json<Vec<Testimonial>> {
    Json(db.get_testimonials(Some(VisibilityStatus::Active)).await)
}

#[get("/settings")]
pub async fn settings(db: &State<DatabaseService>) -> Json<BTreeMap<String, SettingValue>> {
    Json(db.get_all_settings().await)
}

// ── Contact form ───────────────────────────────────────

#[post("/contact", format = "json", data = "<form>")]
pub async fn contact(db: &State<DatabaseService>, form: Json<ContactForm>) -> Json<WriteResult> {
    Json(db.create_contact_message(&form).await)
}

// ── Health ─────────────────────────────────────────────

#[get("/health")]
pub fn health(db: &State<DatabaseService>) -> Json<Value> {
    Json(json!({
        "status": if db.is_available() { "ok" } else { "degraded" },
        "backend": db.backend_name(),
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        products,
        product,
        blog_posts,
        faqs,
        testimonials,
        settings,
        contact,
        health,
    ]
}
