use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Statement};
use serde::Serialize;

use crate::parser::{ProductRecord, RecordSink};
use crate::price::price_value;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            source      TEXT,
            name        TEXT,
            price       TEXT,
            store       TEXT,
            observed_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_products_source ON products(source);
        ",
    )?;
    Ok(())
}

// ── Writing ──

/// Inserts one row per record. Each insert autocommits, so a record is on disk
/// before the next block is looked at.
pub struct ProductSink<'conn> {
    insert: Statement<'conn>,
}

impl<'conn> ProductSink<'conn> {
    pub fn new(conn: &'conn Connection) -> Result<Self> {
        let insert = conn.prepare(
            "INSERT INTO products (source, name, price, store, observed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        Ok(Self { insert })
    }
}

impl RecordSink for ProductSink<'_> {
    fn save(&mut self, r: &ProductRecord) -> Result<i64> {
        let id = self.insert.insert(rusqlite::params![
            r.source,
            r.name,
            r.price,
            r.store,
            r.observed_at.to_rfc3339(),
        ])?;
        Ok(id)
    }
}

// ── Reading ──

#[derive(Debug, Clone, Serialize)]
pub struct ListedProduct {
    /// 1-based position in this listing.
    pub no: usize,
    pub id: i64,
    pub source: String,
    pub name: String,
    pub price: String,
    pub store: String,
    pub observed_at: String,
    pub price_value: f64,
}

/// Newest first, optionally keeping only names containing `filter` (any case).
pub fn fetch_products(
    conn: &Connection,
    filter: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<ListedProduct>> {
    let needle = filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let mut stmt = conn.prepare(
        "SELECT id, COALESCE(source,''), COALESCE(name,''), COALESCE(price,''),
                COALESCE(store,''), COALESCE(observed_at,'')
         FROM products
         ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ListedProduct {
                no: 0,
                id: row.get(0)?,
                source: row.get(1)?,
                name: row.get(2)?,
                price: row.get(3)?,
                store: row.get(4)?,
                observed_at: row.get(5)?,
                price_value: 0.0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let listed = rows
        .into_iter()
        .filter(|p| match &needle {
            Some(n) => p.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(i, p)| ListedProduct {
            no: i + 1,
            price_value: price_value(&p.price),
            ..p
        })
        .collect();
    Ok(listed)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub by_source: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(
        "SELECT COALESCE(source,''), COUNT(*) FROM products
         GROUP BY source
         ORDER BY COUNT(*) DESC, source",
    )?;
    let by_source = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats { total, by_source })
}
