use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow layout of a collection table; `dim` is the embedding width.
pub fn build_record_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, true),
		Field::new("chunk", DataType::Int32, true),
		Field::new("file_path", DataType::Utf8, true),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
	]))
}

/// Width of the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name("vector").ok()?.data_type() {
		DataType::FixedSizeList(_, n) => Some(*n as usize),
		_ => None,
	}
}
