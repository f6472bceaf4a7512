use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool_at(path: &str) -> Result<DbPool, String> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // WAL for concurrent readers
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Products (soft-deleted via status = 'deleted')
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            price REAL,
            image_url TEXT,
            all_images TEXT NOT NULL DEFAULT '[]',
            category TEXT,
            brand TEXT,
            model TEXT,
            features TEXT NOT NULL DEFAULT '[]',
            specifications TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'active',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Blog posts (soft-deleted via status = 'deleted')
        CREATE TABLE IF NOT EXISTS blog_posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            excerpt TEXT,
            featured_image TEXT,
            author TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            tags TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- FAQs (hard-deleted)
        CREATE TABLE IF NOT EXISTS faqs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            answer TEXT NOT NULL DEFAULT '',
            category TEXT,
            order_index INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'active',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS testimonials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            company TEXT,
            position TEXT,
            content TEXT NOT NULL DEFAULT '',
            rating INTEGER NOT NULL DEFAULT 5,
            avatar_url TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS contact_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            subject TEXT,
            message TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'unread',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Settings (typed key-value)
        CREATE TABLE IF NOT EXISTS site_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT UNIQUE NOT NULL,
            value TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL DEFAULT 'text',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_products_status ON products(status);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_status ON blog_posts(status);
        CREATE INDEX IF NOT EXISTS idx_faqs_order ON faqs(order_index);
        CREATE INDEX IF NOT EXISTS idx_messages_status ON contact_messages(status);
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "Heating & Cooling Co.", "text"),
        ("site_tagline", "Comfort in every season", "text"),
        ("contact_email", "", "text"),
        ("contact_phone", "", "text"),
        ("contact_address", "", "text"),
        // Service
        ("emergency_service", "true", "boolean"),
        ("service_radius_km", "50", "number"),
        (
            "business_hours",
            r#"{"weekdays":"08:00-18:00","saturday":"09:00-14:00","sunday":"closed"}"#,
            "json",
        ),
        // Content
        ("blog_posts_per_page", "9", "number"),
        ("show_prices", "true", "boolean"),
        ("maintenance_mode", "false", "boolean"),
        // Social
        ("social_links", "{}", "json"),
    ];

    for (key, value, kind) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO site_settings (key, value, type) VALUES (?1, ?2, ?3)",
            params![key, value, kind],
        )?;
    }

    Ok(())
}
