//! Domain types

pub mod pagination;

pub use pagination::{Cursor, Direction, GraphEnvelope, PageCursor, PageResult, Paging};
