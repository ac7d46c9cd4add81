//! Purpose: Hand-written codec for the comma-separated text table format.
//! Exports: `decode`, `decode_str`, `decode_reader`, `encode`, `encode_to_string`, `SEPARATOR`.
//! Role: The only place that knows how text lines map to `Table` values.
//! Invariants: Fields split on a literal `,`; no quoting or escaping in either direction.
//! Invariants: Body lines whose width differs from the header are dropped without error.
//! Invariants: Encoding requires at least one record; output lines end with `\n`.
//! Notes: This module performs no I/O on locations and emits no log events.
use std::io::{self, BufRead};

use crate::core::error::{Error, ErrorKind};
use crate::core::table::{Record, Schema, Table};

pub const SEPARATOR: char = ',';

/// Decode a header line followed by body lines.
///
/// Lines may carry a trailing `\n` or `\r\n`. Empty input yields [`Table::empty`];
/// a blank header line yields a schema with no fields and no records.
pub fn decode<I, S>(lines: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = lines.into_iter();
    let Some(header) = lines.next() else {
        return Table::empty();
    };
    let header = strip_terminator(header.as_ref());
    if header.is_empty() {
        // A blank header names no fields, so no body line can match it.
        return Table::from_parts(Schema::default(), Vec::new());
    }
    let schema = Schema::new(split(header));

    let records = lines
        .filter_map(|line| {
            let values: Vec<&str> = split(line.as_ref()).collect();
            (values.len() == schema.len()).then(|| Record::new(values))
        })
        .collect();

    Table::from_parts(schema, records)
}

pub fn decode_str(input: &str) -> Table {
    decode(input.lines())
}

/// Decode from a buffered reader. Only read failures (including invalid UTF-8) error.
pub fn decode_reader<R: BufRead>(reader: R) -> io::Result<Table> {
    let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
    Ok(decode(lines))
}

/// Encode a table into its text lines, each terminated by `\n`.
pub fn encode(table: &Table) -> Result<Vec<String>, Error> {
    if table.is_empty() {
        return Err(Error::new(ErrorKind::EmptyTable)
            .with_message("cannot write a table with no records")
            .with_hint("The header is only written alongside at least one record."));
    }
    let schema = table.schema().ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message("table has records but no schema")
    })?;

    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(join(schema.fields()));
    lines.extend(table.records().iter().map(|record| join(record.values())));
    Ok(lines)
}

pub fn encode_to_string(table: &Table) -> Result<String, Error> {
    Ok(encode(table)?.concat())
}

fn split(line: &str) -> impl Iterator<Item = &str> {
    strip_terminator(line).split(SEPARATOR)
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn join(values: &[String]) -> String {
    let mut out = values.join(",");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_reader, decode_str, encode, encode_to_string};
    use crate::core::error::ErrorKind;
    use crate::core::table::{Record, Schema, Table};

    #[test]
    fn malformed_rows_are_dropped() {
        let table = decode_str("a,b,c\n1,2,3\n4,5\n6,7,8\n");
        assert_eq!(table.schema(), Some(&Schema::new(["a", "b", "c"])));
        assert_eq!(
            table.records(),
            &[Record::new(["1", "2", "3"]), Record::new(["6", "7", "8"])]
        );
        assert_eq!(
            encode_to_string(&table).expect("encode"),
            "a,b,c\n1,2,3\n6,7,8\n"
        );
    }

    #[test]
    fn terminators_are_stripped() {
        let table = decode(["x,y\r\n", "1,2\r\n", "3,4\n", "5,6"]);
        assert_eq!(table.schema(), Some(&Schema::new(["x", "y"])));
        assert_eq!(table.column("y"), Some(vec!["2", "4", "6"]));
    }

    #[test]
    fn wider_rows_are_dropped_too() {
        let table = decode_str("a,b\n1,2,3\n4,5\n");
        assert_eq!(table.records(), &[Record::new(["4", "5"])]);
    }

    #[test]
    fn empty_input_has_no_schema() {
        let table = decode(Vec::<String>::new());
        assert!(table.schema().is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn header_only_has_schema_and_no_records() {
        let table = decode_str("a,b\n");
        assert_eq!(table.schema().map(Schema::len), Some(2));
        assert!(table.is_empty());
    }

    #[test]
    fn blank_body_line_matches_single_field_schema() {
        let table = decode_str("only\nx\n\ny\n");
        assert_eq!(table.column("only"), Some(vec!["x", "", "y"]));

        let table = decode_str("a,b\n1,2\n\n");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn blank_header_keeps_no_rows() {
        let table = decode_str("\nx\ny\n\n");
        assert_eq!(table.schema(), Some(&Schema::default()));
        assert!(table.is_empty());

        let table = decode(["\r\n", "x\r\n"]);
        assert_eq!(table.schema().map(Schema::len), Some(0));
        assert!(table.is_empty());
        let err = encode(&table).expect_err("nothing to write");
        assert_eq!(err.kind(), ErrorKind::EmptyTable);
    }

    #[test]
    fn duplicate_header_names_are_accepted() {
        let table = decode_str("a,a\n1,2\n");
        assert_eq!(table.schema().map(Schema::duplicate_fields), Some(vec!["a"]));
        assert_eq!(table.records(), &[Record::new(["1", "2"])]);
    }

    #[test]
    fn encode_rejects_empty_table() {
        let err = encode(&Table::empty()).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::EmptyTable);

        let header_only = decode_str("a,b\n");
        let err = encode(&header_only).expect_err("header only");
        assert_eq!(err.kind(), ErrorKind::EmptyTable);
    }

    #[test]
    fn encode_emits_terminated_lines() {
        let table = Table::new(
            Schema::new(["k", "v"]),
            vec![Record::new(["a", "1"]), Record::new(["b", ""])],
        )
        .expect("table");
        assert_eq!(
            encode(&table).expect("encode"),
            vec!["k,v\n".to_string(), "a,1\n".to_string(), "b,\n".to_string()]
        );
    }

    #[test]
    fn embedded_separator_is_not_escaped() {
        let table = Table::new(Schema::new(["a", "b"]), vec![Record::new(["1,5", "2"])])
            .expect("table");
        let text = encode_to_string(&table).expect("encode");
        assert_eq!(text, "a,b\n1,5,2\n");
        assert!(decode_str(&text).is_empty());
    }

    #[test]
    fn reader_round_trip_preserves_order() {
        let table = Table::new(
            Schema::new(["n", "sq"]),
            (1..=20)
                .map(|n| Record::new([n.to_string(), (n * n).to_string()]))
                .collect(),
        )
        .expect("table");
        let text = encode_to_string(&table).expect("encode");
        let decoded = decode_reader(text.as_bytes()).expect("decode");
        assert_eq!(decoded, table);
    }

    #[test]
    fn reader_rejects_invalid_utf8() {
        let bytes: &[u8] = b"a,b\n\xff,1\n";
        assert!(decode_reader(bytes).is_err());
    }
}
