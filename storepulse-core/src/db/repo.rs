//! Database repository layer
//!
//! Provides insert and update operations for the back-office entities, and
//! the SQL evaluation of metric queries.

use super::DataStore;
use crate::error::{Error, Result};
use crate::metrics::{Aggregation, FilterOp, FilterValue, MetricQuery};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Stored timestamp text.
///
/// Fixed width (second precision, `Z` suffix) so that string comparison in
/// SQL orders the same way as the instants do.
pub(crate) fn to_sql_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        super::schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::DataUnavailable("database connection lock poisoned".to_string()))
    }

    // ============================================
    // Customer operations
    // ============================================

    pub fn insert_customer(&self, customer: &Customer) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO customers (id, name, email, country, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                customer.id,
                customer.name,
                customer.email,
                customer.country,
                to_sql_ts(customer.created_at),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Product operations
    // ============================================

    pub fn insert_product(&self, product: &Product) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO products (id, name, sku, category, price, stock, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                product.id,
                product.name,
                product.sku,
                product.category,
                product.price,
                product.stock,
                product.status.as_str(),
                to_sql_ts(product.created_at),
            ],
        )?;
        Ok(())
    }

    /// Set the units on hand. Returns false if the product does not exist.
    pub fn update_product_stock(&self, product_id: &str, stock: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE products SET stock = ?1 WHERE id = ?2",
            params![stock, product_id],
        )?;
        Ok(changed > 0)
    }

    // ============================================
    // Order operations
    // ============================================

    pub fn insert_order(&self, order: &Order) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO orders (id, customer_id, status, total, currency, item_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                order.id,
                order.customer_id,
                order.status.as_str(),
                order.total,
                order.currency,
                order.item_count,
                to_sql_ts(order.created_at),
            ],
        )?;
        Ok(())
    }

    /// Insert a batch of orders in one transaction
    pub fn insert_orders(&self, orders: &[Order]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO orders (id, customer_id, status, total, currency, item_count, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for order in orders {
                stmt.execute(params![
                    order.id,
                    order.customer_id,
                    order.status.as_str(),
                    order.total,
                    order.currency,
                    order.item_count,
                    to_sql_ts(order.created_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Move an order to a new status. Returns false if the order does not exist.
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![status.as_str(), order_id],
        )?;
        Ok(changed > 0)
    }

    // ============================================
    // Review operations
    // ============================================

    pub fn insert_review(&self, review: &Review) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO reviews (id, product_id, rating, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                review.id,
                review.product_id,
                review.rating,
                review.status.as_str(),
                to_sql_ts(review.created_at),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Campaign operations
    // ============================================

    pub fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO campaigns (id, name, status, budget, starts_at, ends_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                campaign.id,
                campaign.name,
                campaign.status.as_str(),
                campaign.budget,
                campaign.starts_at.map(to_sql_ts),
                campaign.ends_at.map(to_sql_ts),
                to_sql_ts(campaign.created_at),
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Stats
    // ============================================

    /// Total rows per entity, for diagnostics.
    pub fn count_rows(&self, entity: Entity) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", entity.table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

// ============================================
// Metric evaluation
// ============================================

fn bind_value(value: &FilterValue, params: &mut Vec<Value>) -> usize {
    match value {
        FilterValue::Text(s) => params.push(Value::Text(s.clone())),
        FilterValue::Integer(i) => params.push(Value::Integer(*i)),
        FilterValue::Real(r) => params.push(Value::Real(*r)),
        FilterValue::List(values) => {
            return values.iter().map(|v| bind_value(v, params)).sum();
        }
    }
    1
}

/// Build the SQL text and bound parameters for an already validated query.
///
/// Identifiers come from the entity whitelists; every literal is a parameter.
pub(crate) fn metric_sql(query: &MetricQuery) -> (String, Vec<Value>) {
    let entity = query.entity;
    let select = match &query.aggregation {
        Aggregation::Count => "COUNT(*)".to_string(),
        Aggregation::Sum(field) => format!("SUM({})", field),
        Aggregation::Avg(field) => format!("AVG({})", field),
    };

    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(predicate) = &query.predicate {
        for condition in &predicate.conditions {
            let bound = bind_value(&condition.value, &mut params);
            match condition.op {
                FilterOp::In => {
                    let marks = vec!["?"; bound].join(", ");
                    clauses.push(format!("{} IN ({})", condition.field, marks));
                }
                op => clauses.push(format!("{} {} ?", condition.field, op.as_sql())),
            }
        }
    }

    if let Some(window) = &query.window {
        let column = entity.timestamp_column();
        clauses.push(format!("{} >= ?", column));
        clauses.push(format!("{} < ?", column));
        params.push(Value::Text(to_sql_ts(window.start)));
        params.push(Value::Text(to_sql_ts(window.end)));
    }

    let mut sql = format!("SELECT {} FROM {}", select, entity.table());
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    (sql, params)
}

impl DataStore for Database {
    fn evaluate(&self, query: &MetricQuery) -> Result<Option<f64>> {
        let (sql, params) = metric_sql(query);
        let conn = self.conn()?;
        conn.query_row(&sql, params_from_iter(params), |r| r.get::<_, Option<f64>>(0))
            .map_err(|e| {
                tracing::warn!(error = %e, sql = %sql, "Metric query failed");
                Error::DataUnavailable(format!("{} over {}: {}", query.aggregation, query.entity, e))
            })
    }
}
