use arrow_array::{
    Array, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray,
};
use csvbatch_core::arrow_conversion::arrow_to_cell_value;
use csvbatch_core::*;

use test_helpers::*;

const ORDERS_SCHEMA: &str = r#"
[[fields]]
name = "id"
type = "int64"

[[fields]]
name = "customer"
type = "string"

[[fields]]
name = "quantity"
type = "int32"
nullable = true

[[fields]]
name = "paid"
type = "bool"

[[fields]]
name = "total"
type = "decimal"
precision = 10
scale = 2

[[fields]]
name = "ordered_on"
type = "date"

[[fields]]
name = "shipped_at"
type = "timestamp"
nullable = true

[[fields]]
name = "weight"
type = "float64"
nullable = true

[[fields]]
name = "note"
type = "bytes"
"#;

const ORDERS_CSV: &str = "\
id;customer;quantity;paid;total;ordered_on;shipped_at;weight;note
1;Alice;3;yes;19.99;2024-01-15;2024-01-16T08:30:00Z;1.25;fragile
2;\"Bob; Jr\";;FALSE;5;2024-02-29;;;
3;Carol; 7 ;1;-0.5;1970-01-01;1970-01-01T00:00:00.000001;  2.5 ;x
";

fn orders() -> (SchemaDefinition, Header, Batch) {
    let definition = SchemaDefinition::from_toml_str(ORDERS_SCHEMA).unwrap();
    let mut reader = reader(ORDERS_CSV);
    let batch = reader.read_batch(3).unwrap();
    let header = reader.header().cloned().unwrap();
    (definition, header, batch)
}

fn column<'a, T: 'static>(batch: &'a arrow_array::RecordBatch, name: &str) -> &'a T {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<T>()
        .unwrap()
}

#[test]
fn test_convert_all_types() {
    let (definition, header, batch) = orders();
    let converter = BatchConverter::new(&definition, &header).unwrap();
    let record_batch = converter.convert(&batch).unwrap();

    assert_eq!(record_batch.num_rows(), 3);
    assert_eq!(record_batch.num_columns(), 9);

    let ids = column::<Int64Array>(&record_batch, "id");
    assert_eq!(ids.iter().collect::<Vec<_>>(), vec![Some(1), Some(2), Some(3)]);

    let customers = column::<StringArray>(&record_batch, "customer");
    assert_eq!(customers.value(1), "Bob; Jr");

    let quantities = column::<Int32Array>(&record_batch, "quantity");
    assert_eq!(quantities.value(0), 3);
    assert!(quantities.is_null(1));
    assert_eq!(quantities.value(2), 7);

    let paid = column::<BooleanArray>(&record_batch, "paid");
    assert!(paid.value(0));
    assert!(!paid.value(1));
    assert!(paid.value(2));

    let totals = column::<Decimal128Array>(&record_batch, "total");
    assert_eq!(totals.value(0), 1999);
    assert_eq!(totals.value(1), 500);
    assert_eq!(totals.value(2), -50);
    assert_eq!(totals.scale(), 2);

    let ordered_on = column::<Date32Array>(&record_batch, "ordered_on");
    assert_eq!(ordered_on.value(0), 19737);
    assert_eq!(ordered_on.value(1), 19782);
    assert_eq!(ordered_on.value(2), 0);

    let shipped_at = column::<TimestampMicrosecondArray>(&record_batch, "shipped_at");
    assert_eq!(shipped_at.value(0), 1_705_393_800_000_000);
    assert!(shipped_at.is_null(1));
    assert_eq!(shipped_at.value(2), 1);

    let weights = column::<Float64Array>(&record_batch, "weight");
    assert_eq!(weights.value(0), 1.25);
    assert!(weights.is_null(1));
    assert_eq!(weights.value(2), 2.5);

    // Non-nullable bytes keep the empty value
    let notes = column::<BinaryArray>(&record_batch, "note");
    assert_eq!(notes.value(0), b"fragile");
    assert!(!notes.is_null(1));
    assert_eq!(notes.value(1), b"");
}

#[test]
fn test_output_follows_schema_order() {
    let definition = SchemaDefinition::builder()
        .with_field(FieldSpec::new("c", FieldType::String))
        .with_field(FieldSpec::new("a", FieldType::Int32))
        .build()
        .unwrap();

    let mut reader = reader("a;b;c\n1;ignored;x\n");
    let batch = reader.read_batch(1).unwrap();
    let converter = BatchConverter::new(&definition, reader.header().unwrap()).unwrap();
    let record_batch = converter.convert(&batch).unwrap();

    let schema = record_batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["c", "a"]);
    assert_eq!(
        arrow_to_cell_value(record_batch.column(0).as_ref(), 0).unwrap(),
        CellValue::String("x".into())
    );
    assert_eq!(
        arrow_to_cell_value(record_batch.column(1).as_ref(), 0).unwrap(),
        CellValue::Int32(1)
    );
}

#[test]
fn test_missing_column() {
    let (definition, _, _) = orders();
    let header = Header::new(vec!["id".to_string(), "customer".to_string()]);

    match BatchConverter::new(&definition, &header).unwrap_err() {
        SchemaError::MissingColumn(name) => assert_eq!(name, "quantity"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_conversion_failures_name_row_and_column() {
    let definition = SchemaDefinition::from_toml_str(ORDERS_SCHEMA).unwrap();
    let cases = [
        ("4;D;1;maybe;1.00;2024-01-01;;;n", "paid"),
        ("4;D;1;no;1.001;2024-01-01;;;n", "total"),
        ("4;D;1;no;1.00;2024-13-01;;;n", "ordered_on"),
        ("4;D;1;no;1.00;2024-01-01;soon;;n", "shipped_at"),
        ("4;D;1.5;no;1.00;2024-01-01;;;n", "quantity"),
        (";D;1;no;1.00;2024-01-01;;;n", "id"),
        ("4;D;1;no;1.00;2024-01-01;;heavy;n", "weight"),
    ];

    for (bad_row, bad_column) in cases {
        let data = format!(
            "id;customer;quantity;paid;total;ordered_on;shipped_at;weight;note\n\
             1;A;1;yes;1.00;2024-01-01;;;n\n{}\n",
            bad_row
        );
        let mut reader = reader(&data);
        let batch = reader.read_batch(2).unwrap();
        let converter = BatchConverter::new(&definition, reader.header().unwrap()).unwrap();

        match converter.convert(&batch).unwrap_err() {
            SchemaError::Conversion { row, column, .. } => {
                assert_eq!(row, 2, "{}", bad_row);
                assert_eq!(column, bad_column, "{}", bad_row);
            }
            other => panic!("expected Conversion for {:?}, got {:?}", bad_row, other),
        }
    }
}

#[test]
fn test_decimal_precision_overflow() {
    let definition = SchemaDefinition::builder()
        .with_field(FieldSpec::new(
            "amount",
            FieldType::Decimal {
                precision: 4,
                scale: 2,
            },
        ))
        .with_field(FieldSpec::new("id", FieldType::Int32))
        .build()
        .unwrap();

    let mut reader = reader("id;amount\n1;99.99\n2;100.00\n");
    let batch = reader.read_batch(2).unwrap();
    let converter = BatchConverter::new(&definition, reader.header().unwrap()).unwrap();

    let err = converter.convert(&batch).unwrap_err();
    assert!(err.to_string().contains("row 2"));
    assert!(err.to_string().contains("precision is 4"));
}

#[test]
fn test_formatted_temporal_fields() {
    let definition = SchemaDefinition::builder()
        .with_field(FieldSpec::new("day", FieldType::Date).with_format("%d/%m/%Y"))
        .with_field(
            FieldSpec::new("at", FieldType::Timestamp).with_format("%Y-%m-%d %H:%M:%S %z"),
        )
        .build()
        .unwrap();

    let mut reader = reader("day;at\n02/01/1970;1970-01-01 01:00:00 +0100\n");
    let batch = reader.read_batch(1).unwrap();
    let converter = BatchConverter::new(&definition, reader.header().unwrap()).unwrap();
    let record_batch = converter.convert(&batch).unwrap();

    assert_eq!(column::<Date32Array>(&record_batch, "day").value(0), 1);
    assert_eq!(
        column::<TimestampMicrosecondArray>(&record_batch, "at").value(0),
        0
    );
}

#[test]
fn test_converter_is_reused_across_batches() {
    let definition = SchemaDefinition::builder()
        .with_field(FieldSpec::new("id", FieldType::Int64))
        .with_field(FieldSpec::new("score", FieldType::Float64))
        .build()
        .unwrap();

    let data = generate_csv(30);
    let mut reader = buffered_reader(data.as_bytes(), 128);

    let first = reader.read_batch(10).unwrap();
    let converter = BatchConverter::new(&definition, reader.header().unwrap()).unwrap();

    let mut total_rows = converter.convert(&first).unwrap().num_rows();
    for batch in reader.batches(10) {
        let record_batch = converter.convert(&batch.unwrap()).unwrap();
        assert_eq!(record_batch.schema(), converter.schema());
        total_rows += record_batch.num_rows();
    }
    assert_eq!(total_rows, 30);
}
