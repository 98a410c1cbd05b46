//! Trade data import from CSV files
//!
//! Reads `Location,FromCount,FromItem,ToCount,ToItem` tables, validates them
//! through the catalog builder and stores the resulting rules.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::db;
use crate::models::TradeRecord;

/// Read every row of a trade data file without validating it
pub fn read_trade_file(path: &Path) -> Result<Vec<TradeRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for row in reader.deserialize::<TradeRecord>() {
        let record = row.with_context(|| format!("Failed to parse {}", path.display()))?;
        records.push(record);
    }

    debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Load and validate a single trade data file
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let records = read_trade_file(path)?;
    let catalog = Catalog::build(records).with_context(|| format!("Invalid trade data in {}", path.display()))?;
    info!(
        "Loaded {} trades over {} items from {}",
        catalog.len(),
        catalog.known_items().len(),
        path.display()
    );
    Ok(catalog)
}

/// Find all *.csv files under a directory, sorted by path
pub fn find_trade_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Import a trade data file, or every trade data file in a directory
///
/// All files are validated before anything is written.
pub fn import_to_database(conn: &Connection, path: &Path) -> Result<ImportStats> {
    let files = if path.is_dir() {
        find_trade_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    info!("Importing {} trade data files", files.len());

    let mut stats = ImportStats::default();
    let mut catalogs = Vec::with_capacity(files.len());
    for file in &files {
        let records = read_trade_file(file)?;
        stats.records += records.len();
        let catalog = Catalog::build(records).with_context(|| format!("Invalid trade data in {}", file.display()))?;
        catalogs.push(catalog);
    }
    stats.files = files.len();

    let tx = conn.unchecked_transaction()?;
    for rule in catalogs.iter().flat_map(Catalog::rules) {
        if db::insert_trade(&tx, rule)? {
            stats.inserted += 1;
        }
    }
    tx.commit()?;

    stats.duplicates = stats.records - stats.inserted;
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub records: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} trades from {} files ({} rows, {} duplicates)",
            self.inserted, self.files, self.records, self.duplicates
        )
    }
}
