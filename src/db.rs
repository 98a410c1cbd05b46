//! SQLite store for imported trade rules

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::TradeRule;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per distinct trade; identical rows collapse
        CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL,
            from_count INTEGER NOT NULL CHECK (from_count > 0),
            from_item TEXT NOT NULL,
            to_count INTEGER NOT NULL CHECK (to_count > 0),
            to_item TEXT NOT NULL,
            UNIQUE (location, from_count, from_item, to_count, to_item)
        );

        CREATE INDEX IF NOT EXISTS idx_trades_from_item ON trades(from_item);
        CREATE INDEX IF NOT EXISTS idx_trades_to_item ON trades(to_item);
        "#,
    )?;
    Ok(())
}

/// Insert a trade, returning false if an identical one is already stored
pub fn insert_trade(conn: &Connection, rule: &TradeRule) -> Result<bool> {
    let from_count = i64::try_from(rule.from_count)
        .with_context(|| format!("from_count {} is too large to store", rule.from_count))?;
    let to_count = i64::try_from(rule.to_count)
        .with_context(|| format!("to_count {} is too large to store", rule.to_count))?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO trades (location, from_count, from_item, to_count, to_item)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &rule.location,
            from_count,
            &rule.from_item,
            to_count,
            &rule.to_item,
        ),
    )?;
    Ok(inserted > 0)
}

/// Remove all stored trades
pub fn clear_trades(conn: &Connection) -> Result<()> {
    conn.execute_batch("DELETE FROM trades;")?;
    Ok(())
}

/// List all stored trades, in insertion order
pub fn list_trades(conn: &Connection) -> Result<Vec<TradeRule>> {
    let mut stmt = conn.prepare(
        "SELECT location, from_count, from_item, to_count, to_item FROM trades ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (location, from_count, from_item, to_count, to_item) = row?;
        results.push(TradeRule {
            location,
            from_count: u64::try_from(from_count).context("stored from_count is negative")?,
            from_item,
            to_count: u64::try_from(to_count).context("stored to_count is negative")?,
            to_item,
        });
    }
    Ok(results)
}

/// List all distinct trade locations
pub fn list_locations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT location FROM trades ORDER BY location")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
