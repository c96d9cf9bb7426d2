//! Arrow schema for the per-dimension embedding tables.
//!
//! Every dimension index (`embeddings-{dim}d`) shares one layout; only the
//! width of the vector column differs. Metadata travels as a JSON object so
//! numbers and booleans keep their types.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, FieldRef, Schema};

pub const KEY_COLUMN: &str = "key";
pub const MODALITY_COLUMN: &str = "modality";
pub const METADATA_COLUMN: &str = "metadata";
pub const VECTOR_COLUMN: &str = "vector";

/// Column added by LanceDB to vector search results.
pub const DISTANCE_COLUMN: &str = "_distance";

/// Element field of the vector column.
pub fn item_field() -> FieldRef {
    Arc::new(Field::new("item", DataType::Float32, true))
}

pub fn vector_field(dimension: i32) -> Field {
    Field::new(VECTOR_COLUMN, DataType::FixedSizeList(item_field(), dimension), false)
}

/// Schema of the `embeddings-{dimension}d` table.
pub fn embedding_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new(KEY_COLUMN, DataType::Utf8, false),
        Field::new(MODALITY_COLUMN, DataType::Utf8, true),
        Field::new(METADATA_COLUMN, DataType::Utf8, false),
        vector_field(dimension),
    ])
}
