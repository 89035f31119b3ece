pub mod form;
pub mod item;
pub mod media;
pub mod metadata;
pub mod status;

pub use form::{ItemForm, ItemPatch, ValidationError, MAX_RATING, MIN_RATING};
pub use item::{normalize_title, Item};
pub use media::{ItemId, MediaKind};
pub use metadata::{MetadataMatch, Trailer};
pub use status::{StatusCategory, WatchStatus};
