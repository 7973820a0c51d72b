pub mod document;
pub mod query;
pub mod selector;
pub mod snapshot;
