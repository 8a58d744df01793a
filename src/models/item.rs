use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a list item.
///
/// Items minted on the client start out `Provisional`. The server assigns a
/// `Durable` identity the first time it stores the item, and the client only
/// learns it on the next read of the list. The two variants never compare
/// equal to each other, even when their raw strings coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ItemId {
    Provisional(String),
    Durable(String),
}

impl ItemId {
    /// Mints a fresh provisional identity from the current timestamp (ms)
    /// plus a random three-digit tie-break.
    ///
    /// Two items minted in the same millisecond collide with probability
    /// 1/1000. This is a known, accepted gap: provisional identities only
    /// live until the next read from the server.
    pub fn provisional() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let tie_break: u16 = rand::rng().random_range(0..1000);
        ItemId::Provisional(format!("{}{:03}", millis, tie_break))
    }

    pub fn durable(id: impl Into<String>) -> Self {
        ItemId::Durable(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, ItemId::Provisional(_))
    }

    /// The raw identifier string, regardless of variant.
    pub fn as_raw(&self) -> &str {
        match self {
            ItemId::Provisional(raw) | ItemId::Durable(raw) => raw,
        }
    }

    /// The server-assigned identity, if one has been reconciled.
    pub fn durable_id(&self) -> Option<&str> {
        match self {
            ItemId::Durable(raw) => Some(raw),
            ItemId::Provisional(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_raw())
    }
}

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Primary content, usually scanned text.
    pub text: String,
    /// Free-form annotation shown next to the text.
    pub note: String,
    pub is_checked: bool,
}

impl Item {
    /// Creates an unchecked item with an empty note and a fresh provisional identity.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::provisional(),
            text: text.into(),
            note: String::new(),
            is_checked: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.is_checked { "[x]" } else { "[ ]" };
        write!(f, "{} {}", check, self.text)?;
        if !self.note.is_empty() {
            write!(f, "  ({})", self.note)?;
        }
        Ok(())
    }
}

/// Editable text fields of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ItemField {
    Text,
    Note,
}

impl FromStr for ItemField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ItemField::Text),
            "note" => Ok(ItemField::Note),
            other => Err(format!("Unknown item field: {}", other)),
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemField::Text => write!(f, "text"),
            ItemField::Note => write!(f, "note"),
        }
    }
}

/// Wire form of an item.
///
/// `id` is only ever a durable identity. Items that are still provisional
/// travel without one and get an identity assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_checked: bool,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.durable_id().map(str::to_string),
            text: item.text.clone(),
            note: item.note.clone(),
            is_checked: item.is_checked,
        }
    }
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        let id = match record.id {
            Some(id) => ItemId::Durable(id),
            None => ItemId::provisional(),
        };
        Self {
            id,
            text: record.text,
            note: record.note,
            is_checked: record.is_checked,
        }
    }
}
