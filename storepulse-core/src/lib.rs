//! # storepulse-core
//!
//! Core library for storepulse - the metrics behind an e-commerce back-office dashboard.
//!
//! This library provides:
//! - Domain types for orders, products, customers, reviews and campaigns
//! - SQLite storage with embedded migrations
//! - The metric pipeline: aggregator, comparator, series builder, presenter
//! - A data-driven widget catalog and dashboard renderer
//! - Configuration and logging infrastructure
//!
//! ## Pipeline
//!
//! Every widget runs the same read-and-format cycle:
//! - **Aggregator:** count / sum / avg over one entity, optionally filtered and windowed
//! - **Comparator:** percent change and direction against the previous window
//! - **Series Builder:** fixed-length, zero-filled time buckets for charts
//! - **Presenter:** formatted value, trend description, icon and color tier
//!
//! ## Example
//!
//! ```rust,no_run
//! use storepulse_core::dashboard::{default_catalog, Dashboard, RenderContext};
//! use storepulse_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let catalog = default_catalog(&config.dashboard).expect("invalid dashboard config");
//! let dashboard = Dashboard::new(catalog);
//! let report = dashboard.render(&db, &RenderContext::now());
//! for widget in &report.widgets {
//!     println!("{}: {:?}", widget.key, widget.status);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{DataStore, Database};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod types;
