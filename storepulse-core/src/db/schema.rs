//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: customers, catalog and orders
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        email            TEXT NOT NULL UNIQUE,
        country          TEXT,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS products (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        sku              TEXT NOT NULL UNIQUE,
        category         TEXT,
        price            REAL NOT NULL,
        stock            INTEGER NOT NULL DEFAULT 0,
        status           TEXT NOT NULL,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS orders (
        id               TEXT PRIMARY KEY,
        customer_id      TEXT REFERENCES customers(id),
        status           TEXT NOT NULL,
        total            REAL NOT NULL,
        currency         TEXT NOT NULL,
        item_count       INTEGER NOT NULL DEFAULT 1,
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_customers_created ON customers(created_at);
    CREATE INDEX IF NOT EXISTS idx_products_stock ON products(stock);
    CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at);
    CREATE INDEX IF NOT EXISTS idx_orders_status_created ON orders(status, created_at);
    "#,
    // Version 2: reviews and marketing campaigns
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id               TEXT PRIMARY KEY,
        product_id       TEXT NOT NULL REFERENCES products(id),
        rating           INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        status           TEXT NOT NULL,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS campaigns (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        status           TEXT NOT NULL,
        budget           REAL NOT NULL DEFAULT 0,
        starts_at        DATETIME,
        ends_at          DATETIME,
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_reviews_created ON reviews(created_at);
    CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews(product_id);
    CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
