use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::{Item, ItemRecord};

/// A named checklist owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// Durable identity assigned by the store at creation.
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Items in authoritative (insertion) order.
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Created: {}", self.created_at.format("%Y-%m-%d %H:%M"))?;
        write!(f, "Items: {}", self.items.len())
    }
}

/// Wire form of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    pub created_at: DateTime<Utc>,
}

impl From<&List> for ListRecord {
    fn from(list: &List) -> Self {
        Self {
            id: list.id.clone(),
            owner_id: list.owner_id.clone(),
            name: list.name.clone(),
            items: list.items.iter().map(ItemRecord::from).collect(),
            created_at: list.created_at,
        }
    }
}

impl From<ListRecord> for List {
    fn from(record: ListRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            name: record.name,
            items: record.items.into_iter().map(Item::from).collect(),
            created_at: record.created_at,
        }
    }
}

/// Payload of an update request.
///
/// `items`, when present, replaces the whole item array. `name`, when present
/// and non-empty, replaces the list name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ListUpdate {
    /// Full-replace payload: every item plus the current name.
    pub fn full(items: &[Item], name: &str) -> Self {
        Self {
            items: Some(items.iter().map(ItemRecord::from).collect()),
            name: Some(name.to_string()),
        }
    }

    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            items: None,
            name: Some(name.into()),
        }
    }
}
