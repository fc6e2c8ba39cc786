//! A reader for the `reftable` reference storage format: a sequence of immutable, sorted,
//! block-compressed tables listed by `reftable/tables.list`.
pub mod block;
pub mod format;
pub mod record;
pub mod stack;
pub mod table;
pub mod varint;

pub use format::{Footer, Header};
pub use record::{IndexRecord, RefRecord, RefValue};
pub use stack::Stack;
pub use table::Table;
