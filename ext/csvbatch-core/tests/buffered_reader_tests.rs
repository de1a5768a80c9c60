use csvbatch_core::*;

use test_helpers::*;

#[test]
fn test_short_final_batch_at_end_of_stream() {
    let mut reader = buffered_reader("id;name\n1;Alice\n2;Bob\n".as_bytes(), 64);
    let batch = reader.read_batch(3).unwrap();
    assert_eq!(
        batch.into_rows(),
        vec![vec!["1", "Alice"], vec!["2", "Bob"]]
    );
    assert!(matches!(reader.read_batch(3), Err(ReadError::NoData)));
}

#[test]
fn test_rows_split_across_chunks() {
    let data = generate_csv(100);
    for chunk_size in [1, 3, 7, 16, 64, 4096] {
        let mut reader = buffered_reader(data.as_bytes(), chunk_size);
        let rows = collect_rows(&mut reader, 10).unwrap();
        assert_eq!(rows, generated_rows(100), "chunk size {}", chunk_size);
        assert_eq!(reader.rows_read(), 100);
    }
}

#[test]
fn test_batches_are_full_until_the_last() {
    let data = generate_csv(25);
    let mut reader = buffered_reader(data.as_bytes(), 32);

    let sizes: Vec<usize> = reader
        .batches(10)
        .map(|batch| batch.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[test]
fn test_short_reads_from_source() {
    let data = generate_csv(20);
    let mut reader = buffered_reader(TrickleReader::new(data.as_bytes(), 5), 4096);
    let rows = collect_rows(&mut reader, 7).unwrap();
    assert_eq!(rows, generated_rows(20));
}

#[test]
fn test_final_line_without_newline() {
    let mut reader = buffered_reader("id;name\n1;Alice\n2;Bob".as_bytes(), 4);
    let rows = collect_rows(&mut reader, 5).unwrap();
    assert_eq!(rows, vec![vec!["1", "Alice"], vec!["2", "Bob"]]);
}

#[test]
fn test_truncated_quoted_tail_is_malformed() {
    let mut reader = buffered_reader("id;name\n1;Alice\n2;\"Bo".as_bytes(), 8);
    match reader.read_batch(5).unwrap_err() {
        ReadError::MalformedRow { line, .. } => assert_eq!(line, 3),
        other => panic!("expected MalformedRow, got {:?}", other),
    }
}

#[test]
fn test_blank_lines_across_chunk_boundaries() {
    let data = "\r\n\nid;name\r\n\r\n  \r\n1;Alice\r\n\n\n2;Bob\r\n   ";
    let mut reader = buffered_reader(data.as_bytes(), 3);
    let rows = collect_rows(&mut reader, 1).unwrap();
    assert_eq!(rows, vec![vec!["1", "Alice"], vec!["2", "Bob"]]);
}

#[test]
fn test_byte_order_mark_split_across_chunks() {
    let mut reader = buffered_reader("\u{FEFF}id;name\n1;Alice\n".as_bytes(), 2);
    let batch = reader.read_batch(1).unwrap();
    assert_eq!(reader.header().unwrap().names(), ["id", "name"]);
    assert_eq!(batch[0], ["1", "Alice"]);
}

#[test]
fn test_multibyte_characters_split_across_chunks() {
    let data = "id;word\n1;naïve\n2;🎉\n";
    let mut reader = buffered_reader(data.as_bytes(), 1);
    let rows = collect_rows(&mut reader, 2).unwrap();
    assert_eq!(rows, vec![vec!["1", "naïve"], vec!["2", "🎉"]]);
}

#[test]
fn test_error_stops_iteration() {
    let mut reader = buffered_reader("id;name\n1;Alice\n2\n3;Carol\n".as_bytes(), 64);
    let results: Vec<_> = reader.batches(1).collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap()[0], ["1", "Alice"]);
    assert_eq!(
        results[1].as_ref().unwrap_err().kind(),
        ReadErrorKind::ShapeMismatch
    );
}

#[test]
fn test_source_failure_after_data() {
    let mut reader = buffered_reader(FailAfter::new("id;name\n1;Alice\n"), 64);
    assert_eq!(reader.read_batch(1).unwrap()[0], ["1", "Alice"]);

    let err = reader.read_batch(1).unwrap_err();
    assert_eq!(err.kind(), ReadErrorKind::Io);
}

#[test]
fn test_empty_and_header_only_sources() {
    let mut reader = buffered_reader("".as_bytes(), 16);
    assert_eq!(reader.read_batch(1).unwrap_err().kind(), ReadErrorKind::NoData);

    let mut reader = buffered_reader("id;name".as_bytes(), 16);
    assert_eq!(reader.read_batch(1).unwrap_err().kind(), ReadErrorKind::NoData);
    assert_eq!(reader.header().unwrap().names(), ["id", "name"]);
}

#[test]
fn test_release_drops_buffered_bytes() {
    let mut reader = buffered_reader("id;name\n1;Alice\n2;Bob\n".as_bytes(), 64);
    reader.read_batch(1).unwrap();

    // The whole input was pulled by the first read
    let rest = reader.release().unwrap();
    assert!(rest.is_empty());
    assert_eq!(
        reader.read_batch(1).unwrap_err().kind(),
        ReadErrorKind::InvalidRequest
    );
}

#[test]
fn test_options_select_buffered_mode() {
    let options = ReaderOptions::from_toml_str("mode = \"buffered\"\nchunk_size = 5").unwrap();
    let mut reader = BatchReaderBuilder::new()
        .with_options(options)
        .build("id;name\n1;Alice\n".as_bytes())
        .unwrap();

    assert_eq!(reader.mode(), ReadMode::Buffered);
    assert_eq!(reader.read_batch(4).unwrap().len(), 1);
}
