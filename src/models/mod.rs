mod item;

pub use item::{Adjustment, ItemRecord, ItemRef, NewItem, SearchParams};
