mod item;
mod list;

pub use item::{Item, ItemField, ItemId, ItemRecord};
pub use list::{List, ListRecord, ListUpdate};
