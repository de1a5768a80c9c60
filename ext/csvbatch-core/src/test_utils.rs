//! Test utilities for csvbatch-core

#[cfg(test)]
pub mod test {
    use crate::{Batch, BatchReader, FieldSpec, FieldType, Header, SchemaDefinition};

    /// A small semicolon-separated document with a quoted field and empty cells
    pub const SAMPLE_CSV: &str = "id;name;age;salary\n\
                                  1;Alice;30;1000.50\n\
                                  2;Bob;;2000\n\
                                  3;\"Smith; Jr\";45;\n";

    /// Schema matching [`SAMPLE_CSV`]
    pub fn sample_definition() -> SchemaDefinition {
        SchemaDefinition::builder()
            .with_field(FieldSpec::new("id", FieldType::Int64))
            .with_field(FieldSpec::new("name", FieldType::String))
            .with_field(FieldSpec::new("age", FieldType::Int32).nullable(true))
            .with_field(
                FieldSpec::new(
                    "salary",
                    FieldType::Decimal {
                        precision: 10,
                        scale: 2,
                    },
                )
                .nullable(true),
            )
            .build()
            .unwrap()
    }

    /// Read `data` as a single batch of `capacity` rows
    pub fn read_one(data: &str, capacity: usize) -> (Header, Batch) {
        let mut reader = BatchReader::new(data.as_bytes());
        let batch = reader.read_batch(capacity).unwrap();
        let header = reader.header().cloned().unwrap();
        (header, batch)
    }
}
