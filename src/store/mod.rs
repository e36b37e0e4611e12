use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{ItemRecord, NewItem};

// ── Operation results ─────────────────────────────────────────────────────────

/// Result of a name search. Serializes as the bare record for an exact hit
/// and as a `name → record` object for partial hits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Lookup {
    Exact(ItemRecord),
    Partial(IndexMap<String, ItemRecord>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Adjusted {
    Updated(ItemRecord),
    /// Quantity reached exactly zero and the record was dropped.
    Deleted,
}

// ── InventoryStore ────────────────────────────────────────────────────────────

/// In-memory inventory keyed by item name.
///
/// Backed by an `IndexMap` so iteration (and therefore partial-match output)
/// follows the order in which items were first added. Removals use
/// `shift_remove` to keep that order intact for the survivors.
///
/// Every method checks before it mutates: an `Err` return leaves the store
/// exactly as it was.
#[derive(Debug, Default)]
pub struct InventoryStore {
    items: IndexMap<String, ItemRecord>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Insert a new record, or add `quantity` to an existing one.
    ///
    /// Returns the stored record and `true` when it was newly created. A
    /// repeat add never touches `category`, `unit` or `expiry_date`.
    pub fn add(&mut self, item: NewItem) -> AppResult<(ItemRecord, bool)> {
        if let Some(existing) = self.items.get_mut(&item.name) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| AppError::Rejected("Quantity would overflow".to_string()))?;
            return Ok((existing.clone(), false));
        }

        let (name, record) = item.into_record();
        self.items.insert(name, record.clone());
        Ok((record, true))
    }

    /// Exact key first; only when that misses, a case-insensitive substring
    /// scan over every key.
    pub fn get(&self, query: &str) -> AppResult<Lookup> {
        if let Some(record) = self.items.get(query) {
            return Ok(Lookup::Exact(record.clone()));
        }

        let needle = query.to_lowercase();
        let matches: IndexMap<String, ItemRecord> = self
            .items
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();

        if matches.is_empty() {
            Err(AppError::NoMatches(query.to_string()))
        } else {
            Ok(Lookup::Partial(matches))
        }
    }

    /// Apply a signed delta. A result below zero is rejected, exactly zero
    /// removes the record.
    pub fn adjust(&mut self, name: &str, delta: i64) -> AppResult<Adjusted> {
        let current = self
            .items
            .get(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?
            .quantity;

        let next = i128::from(current) + i128::from(delta);
        if next < 0 {
            return Err(AppError::Rejected(
                "Cannot reduce quantity below zero".to_string(),
            ));
        }
        if next == 0 {
            self.items.shift_remove(name);
            return Ok(Adjusted::Deleted);
        }
        let next = u64::try_from(next)
            .map_err(|_| AppError::Rejected("Quantity would overflow".to_string()))?;

        // Presence was checked above and nothing has been removed since.
        let record = self
            .items
            .get_mut(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;
        record.quantity = next;
        Ok(Adjusted::Updated(record.clone()))
    }

    /// Remove a record, returning what was stored.
    pub fn delete(&mut self, name: &str) -> AppResult<ItemRecord> {
        self.items
            .shift_remove(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
impl InventoryStore {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ItemRecord)> {
        self.items.iter()
    }
}
