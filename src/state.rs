//! In-memory state of the list currently open for editing.
//!
//! Every mutation rebuilds the full item array and swaps it in. The caller
//! receives the new array so it can be persisted as a whole.

use crate::models::{Item, ItemField, ItemId, List};

/// The single open list and its mutation operations.
#[derive(Debug, Clone)]
pub struct ListState {
    list: List,
}

impl ListState {
    pub fn new(list: List) -> Self {
        Self { list }
    }

    pub fn list(&self) -> &List {
        &self.list
    }

    pub fn id(&self) -> &str {
        &self.list.id
    }

    pub fn name(&self) -> &str {
        &self.list.name
    }

    /// Items in authoritative order.
    pub fn items(&self) -> &[Item] {
        &self.list.items
    }

    pub fn find(&self, id: &ItemId) -> Option<&Item> {
        self.list.items.iter().find(|item| &item.id == id)
    }

    /// Maps a raw identifier typed by the user onto the identity it names.
    ///
    /// This is the only lookup that compares raw strings across the
    /// provisional/durable split.
    pub fn resolve(&self, raw: &str) -> Option<ItemId> {
        self.list
            .items
            .iter()
            .find(|item| item.id.as_raw() == raw)
            .map(|item| item.id.clone())
    }

    /// Identity of the item at a 1-based position in display order.
    pub fn item_at(&self, position: usize) -> Option<ItemId> {
        let index = position.checked_sub(1)?;
        self.display_order().get(index).map(|item| item.id.clone())
    }

    /// Resolves a user reference: a raw identifier, else a display position.
    pub fn locate(&self, reference: &str) -> Option<ItemId> {
        self.resolve(reference)
            .or_else(|| reference.parse().ok().and_then(|n| self.item_at(n)))
    }

    /// Flips `is_checked` on the matching item. No-op if nothing matches.
    pub fn toggle_checked(&mut self, id: &ItemId) -> &[Item] {
        let items = self
            .list
            .items
            .iter()
            .map(|item| {
                if &item.id == id {
                    Item {
                        is_checked: !item.is_checked,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.replace_items(items)
    }

    pub fn set_field(&mut self, id: &ItemId, field: ItemField, value: impl Into<String>) -> &[Item] {
        let value = value.into();
        let items = self
            .list
            .items
            .iter()
            .map(|item| {
                if &item.id != id {
                    return item.clone();
                }
                let mut updated = item.clone();
                match field {
                    ItemField::Text => updated.text = value.clone(),
                    ItemField::Note => updated.note = value.clone(),
                }
                updated
            })
            .collect();
        self.replace_items(items)
    }

    /// Sets text and note together, leaving `None` fields as they are.
    pub fn edit_item(&mut self, id: &ItemId, text: Option<&str>, note: Option<&str>) -> &[Item] {
        let items = self
            .list
            .items
            .iter()
            .map(|item| {
                let mut updated = item.clone();
                if &item.id == id {
                    if let Some(text) = text {
                        updated.text = text.to_string();
                    }
                    if let Some(note) = note {
                        updated.note = note.to_string();
                    }
                }
                updated
            })
            .collect();
        self.replace_items(items)
    }

    /// Removes the matching item. No-op if nothing matches.
    pub fn delete_item(&mut self, id: &ItemId) -> &[Item] {
        let items = self
            .list
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect();
        self.replace_items(items)
    }

    pub fn append_item(&mut self, item: Item) -> &[Item] {
        self.append_many(std::iter::once(item))
    }

    /// Appends a batch at the end, keeping the batch's own order.
    pub fn append_many(&mut self, new_items: impl IntoIterator<Item = Item>) -> &[Item] {
        let items = self
            .list
            .items
            .iter()
            .cloned()
            .chain(new_items)
            .collect();
        self.replace_items(items)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.list.name = name.into();
    }

    /// Unchecked items first, then checked ones, each group in authoritative order.
    pub fn display_order(&self) -> Vec<&Item> {
        display_order(&self.list.items)
    }

    fn replace_items(&mut self, items: Vec<Item>) -> &[Item] {
        self.list.items = items;
        &self.list.items
    }
}

/// Stable partition of `items` on `is_checked`, unchecked first.
pub fn display_order(items: &[Item]) -> Vec<&Item> {
    let (mut open, done): (Vec<&Item>, Vec<&Item>) =
        items.iter().partition(|item| !item.is_checked);
    open.extend(done);
    open
}
