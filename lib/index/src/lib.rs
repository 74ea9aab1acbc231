mod engine;
mod tantivy_schema;
mod tokenizer;

pub use engine::{Engine, Hit, SearchFilters, SortKey};
pub use tantivy_schema::Fields;
