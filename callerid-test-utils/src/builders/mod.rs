//! Builders for test data

mod entries;

pub use entries::{TestEntryBuilder, TestMatchBuilder};
