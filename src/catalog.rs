//! Trade catalog indexed by source and destination item

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::models::{TradeRecord, TradeRule};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed trade record at row {row}: {field} {reason}")]
    MalformedRecord {
        row: usize,
        field: &'static str,
        reason: String,
    },
}

/// Read-only set of trade rules with lookup by either endpoint.
#[derive(Debug, Default)]
pub struct Catalog {
    rules: BTreeSet<TradeRule>,
    by_from_item: HashMap<String, BTreeSet<TradeRule>>,
    by_to_item: HashMap<String, BTreeSet<TradeRule>>,
    items: BTreeSet<String>,
}

impl Catalog {
    /// Validate raw records and index them.
    ///
    /// Any malformed record fails the whole build. Rows are numbered from 1.
    pub fn build<I>(records: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = TradeRecord>,
    {
        let mut rules = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            rules.push(parse_record(index + 1, &record)?);
        }
        Ok(Self::from_rules(rules))
    }

    /// Index rules that are already known to be valid.
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = TradeRule>,
    {
        let mut catalog = Self::default();
        for rule in rules {
            if catalog.rules.contains(&rule) {
                debug!("Skipping duplicate trade: {}", rule);
                continue;
            }
            catalog.items.insert(rule.from_item.clone());
            catalog.items.insert(rule.to_item.clone());
            catalog
                .by_from_item
                .entry(rule.from_item.clone())
                .or_default()
                .insert(rule.clone());
            catalog
                .by_to_item
                .entry(rule.to_item.clone())
                .or_default()
                .insert(rule.clone());
            catalog.rules.insert(rule);
        }
        catalog
    }

    /// Rules whose source is `item`.
    pub fn rules_from(&self, item: &str) -> impl Iterator<Item = &TradeRule> {
        self.by_from_item.get(item).into_iter().flatten()
    }

    /// Rules whose destination is `item`.
    pub fn rules_to(&self, item: &str) -> impl Iterator<Item = &TradeRule> {
        self.by_to_item.get(item).into_iter().flatten()
    }

    /// Every item appearing on either side of a rule, sorted.
    pub fn known_items(&self) -> &BTreeSet<String> {
        &self.items
    }

    pub fn contains_item(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn rules(&self) -> impl Iterator<Item = &TradeRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_record(row: usize, record: &TradeRecord) -> Result<TradeRule, CatalogError> {
    Ok(TradeRule {
        location: required_text(row, "Location", &record.location)?,
        from_count: positive_count(row, "FromCount", &record.from_count)?,
        from_item: required_text(row, "FromItem", &record.from_item)?,
        to_count: positive_count(row, "ToCount", &record.to_count)?,
        to_item: required_text(row, "ToItem", &record.to_item)?,
    })
}

fn required_text(row: usize, field: &'static str, value: &Option<String>) -> Result<String, CatalogError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(CatalogError::MalformedRecord {
            row,
            field,
            reason: "is missing or empty".to_string(),
        }),
    }
}

fn positive_count(row: usize, field: &'static str, value: &Option<String>) -> Result<u64, CatalogError> {
    let text = required_text(row, field, value)?;
    match text.parse::<u64>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(CatalogError::MalformedRecord {
            row,
            field,
            reason: format!("'{}' is not a positive integer", text),
        }),
    }
}
