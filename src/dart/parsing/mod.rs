pub mod content;
pub mod document;
pub mod sanitize;
pub mod table;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use content::{combine_items, extract_items, extract_items_excluding};
pub use document::{assemble_document, assemble_tree, EXCLUDED_SUBTYPE};
pub use sanitize::sanitize_markup;
pub use table::canonicalize_table;
pub use types::{Assembled, ContentItem, ContentKind, DocumentRecord, Section, SkipReason};
