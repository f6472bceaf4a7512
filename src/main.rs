#[macro_use]
extern crate rocket;

use log::info;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use serde_json::{json, Value};

mod backend;
mod boot;
mod config;
mod db;
mod models;
mod routes;
mod store;


use backend::resolver::BackendResolver;
use backend::QueryBackend;
use config::Config;
use store::DatabaseService;

fn error_body(status: u16, message: &str) -> Json<Value> {
    Json(json!({ "success": false, "error": message, "status": status }))
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    error_body(400, "Bad request")
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    error_body(401, "Unauthorized")
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    error_body(404, &format!("Not found: {}", req.uri().path()))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    error_body(422, "Malformed request body")
}

#[catch(500)]
fn server_error() -> Json<Value> {
    error_body(500, "Internal server error")
}

/// Assemble the server around an already-resolved data layer.
pub fn build_rocket(config: Config, service: DatabaseService) -> Rocket<Build> {
    rocket::build()
        .manage(config)
        .manage(service)
        .mount("/api", routes::api::routes())
        .mount("/admin/api", routes::admin_api::routes())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, server_error],
        )
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let config = Config::load();

    // Boot check: create database directories, warn about fallbacks
    boot::run(&config);

    let resolver = BackendResolver::from_config(&config);
    let backend = resolver.resolve_or_mock();
    info!(
        "Database backend: {} ({})",
        backend.name(),
        resolver.resolved_slot().map(|s| s.as_str()).unwrap_or("none")
    );

    build_rocket(config, DatabaseService::new(backend))
}
