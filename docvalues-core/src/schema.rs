//! Schema definitions for doc values fields

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field identifier, stable within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Field(pub u32);

/// Per-document value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Signed 64-bit integer; 0 means absent
    #[serde(rename = "i64")]
    Int,
    /// 64-bit floating point stored by bit pattern
    #[serde(rename = "f64")]
    Float,
    /// One byte string per document
    #[serde(rename = "bytes")]
    Bytes,
    /// One byte string per document, dictionary-encoded in byte order
    #[serde(rename = "sorted_bytes")]
    SortedBytes,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Int => "i64",
            ValueType::Float => "f64",
            ValueType::Bytes => "bytes",
            ValueType::SortedBytes => "sorted_bytes",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub value_type: ValueType,
}

/// Schema defining which doc values fields a segment carries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SchemaRepr", into = "SchemaRepr")]
pub struct Schema {
    fields: Vec<FieldEntry>,
    name_to_field: HashMap<String, Field>,
}

#[derive(Clone, Serialize, Deserialize)]
struct SchemaRepr {
    fields: Vec<FieldEntry>,
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Self {
        let name_to_field = repr
            .fields
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), Field(i as u32)))
            .collect();
        Self {
            fields: repr.fields,
            name_to_field,
        }
    }
}

impl From<Schema> for SchemaRepr {
    fn from(schema: Schema) -> Self {
        Self {
            fields: schema.fields,
        }
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn get_field(&self, name: &str) -> Option<Field> {
        self.name_to_field.get(name).copied()
    }

    pub fn get_field_entry(&self, field: Field) -> Option<&FieldEntry> {
        self.fields.get(field.0 as usize)
    }

    pub fn get_field_name(&self, field: Field) -> Option<&str> {
        self.fields.get(field.0 as usize).map(|e| e.name.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, &FieldEntry)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, e)| (Field(i as u32), e))
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }
}

/// Builder for Schema
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldEntry>,
}

impl SchemaBuilder {
    pub fn add_i64_field(&mut self, name: &str) -> Field {
        self.add_field(name, ValueType::Int)
    }

    pub fn add_f64_field(&mut self, name: &str) -> Field {
        self.add_field(name, ValueType::Float)
    }

    pub fn add_bytes_field(&mut self, name: &str) -> Field {
        self.add_field(name, ValueType::Bytes)
    }

    pub fn add_sorted_bytes_field(&mut self, name: &str) -> Field {
        self.add_field(name, ValueType::SortedBytes)
    }

    pub fn add_field(&mut self, name: &str, value_type: ValueType) -> Field {
        let field = Field(self.fields.len() as u32);
        self.fields.push(FieldEntry {
            name: name.to_string(),
            value_type,
        });
        field
    }

    pub fn build(self) -> Schema {
        Schema::from(SchemaRepr {
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder() {
        let mut builder = Schema::builder();
        let norms = builder.add_i64_field("norms");
        let price = builder.add_f64_field("price");
        let tag = builder.add_sorted_bytes_field("tag");
        let schema = builder.build();

        assert_eq!(schema.get_field("norms"), Some(norms));
        assert_eq!(schema.get_field("price"), Some(price));
        assert_eq!(schema.get_field("missing"), None);
        assert_eq!(schema.get_field_name(tag), Some("tag"));
        assert_eq!(
            schema.get_field_entry(price).map(|e| e.value_type),
            Some(ValueType::Float)
        );
        assert_eq!(schema.num_fields(), 3);
    }

    #[test]
    fn test_schema_json() {
        let json = r#"{"fields":[
            {"name":"dv","value_type":"i64"},
            {"name":"body","value_type":"bytes"}
        ]}"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.get_field("body"), Some(Field(1)));

        let back = serde_json::to_string(&schema).unwrap();
        let again: Schema = serde_json::from_str(&back).unwrap();
        assert_eq!(again.get_field("dv"), Some(Field(0)));
        assert_eq!(
            again.get_field_entry(Field(1)).map(|e| e.value_type),
            Some(ValueType::Bytes)
        );
    }
}
