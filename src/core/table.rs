//! Purpose: Row-oriented table model shared by the codec and every backend.
//! Exports: `Schema`, `Record`, `Table`, `TableLike`.
//! Role: In-memory shape of a decoded text table; built by reads, consumed by writes.
//! Invariants: Every record in a `Table` has exactly `schema.len()` values.
//! Invariants: A `Table` without a schema holds no records.
//! Invariants: Tables are values; transforms build new tables instead of mutating.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

/// Ordered field names. Position is what binds a value to a field.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the first field called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    /// Names that occur more than once, each reported once in first-seen order.
    ///
    /// Decoding accepts repeated header names; this is how callers find out that
    /// name lookups on the schema are ambiguous.
    pub fn duplicate_fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (idx, field) in self.fields.iter().enumerate() {
            if out.contains(&field.as_str()) {
                continue;
            }
            if self.fields[idx + 1..].contains(field) {
                out.push(field.as_str());
            }
        }
        out
    }
}

/// One row of opaque text values, aligned positionally to a [`Schema`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Table {
    schema: Option<Schema>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table from a writer-supplied schema.
    ///
    /// Rejects a schema with no fields, empty field names, and records whose width
    /// differs from the schema.
    pub fn new(schema: Schema, records: Vec<Record>) -> Result<Self, Error> {
        if schema.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("schema has no fields")
                .with_hint("A written table needs at least one named field."));
        }
        if let Some(idx) = schema.fields().iter().position(|field| field.is_empty()) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("schema field {idx} has an empty name")));
        }
        for (idx, record) in records.iter().enumerate() {
            if record.len() != schema.len() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!(
                        "record has {} values but schema has {} fields",
                        record.len(),
                        schema.len()
                    ))
                    .with_record(idx as u64));
            }
        }
        Ok(Self {
            schema: Some(schema),
            records,
        })
    }

    /// A table with no header and no records (decoded from empty input).
    pub fn empty() -> Self {
        Self::default()
    }

    // Callers guarantee the width invariant; used by decode, which filters rows itself.
    pub(crate) fn from_parts(schema: Schema, records: Vec<Record>) -> Self {
        debug_assert!(records.iter().all(|record| record.len() == schema.len()));
        Self {
            schema: Some(schema),
            records,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of the first field called `name`, in record order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.schema.as_ref()?.position(name)?;
        Some(
            self.records
                .iter()
                .map(|record| record.values[idx].as_str())
                .collect(),
        )
    }

    pub fn into_parts(self) -> (Option<Schema>, Vec<Record>) {
        (self.schema, self.records)
    }
}

/// Shape queries every backend table representation answers.
pub trait TableLike {
    fn schema(&self) -> Option<&Schema>;
    fn record_count(&self) -> usize;
}

impl TableLike for Table {
    fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, Schema, Table};
    use crate::core::error::ErrorKind;

    #[test]
    fn new_rejects_width_mismatch() {
        let schema = Schema::new(["a", "b"]);
        let err = Table::new(schema, vec![Record::new(["1", "2"]), Record::new(["3"])])
            .expect_err("width mismatch");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.record(), Some(1));
    }

    #[test]
    fn new_rejects_empty_field_name() {
        let err = Table::new(Schema::new(["a", ""]), Vec::new()).expect_err("empty name");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn new_rejects_schema_without_fields() {
        let err = Table::new(Schema::new(Vec::<String>::new()), vec![Record::default()])
            .expect_err("no fields");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = Table::new(Schema::default(), Vec::new()).expect_err("no fields, no records");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn column_uses_first_matching_field() {
        let table = Table::new(
            Schema::new(["id", "name", "id"]),
            vec![Record::new(["1", "x", "9"]), Record::new(["2", "y", "8"])],
        )
        .expect("table");
        assert_eq!(table.column("id"), Some(vec!["1", "2"]));
        assert_eq!(table.column("name"), Some(vec!["x", "y"]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn duplicate_fields_reported_once() {
        let schema = Schema::new(["a", "b", "a", "c", "a", "b"]);
        assert_eq!(schema.duplicate_fields(), vec!["a", "b"]);
        assert!(Schema::new(["a", "b"]).duplicate_fields().is_empty());
    }

    #[test]
    fn empty_table_has_no_schema() {
        let table = Table::empty();
        assert!(table.schema().is_none());
        assert!(table.is_empty());
        assert_eq!(table.column("a"), None);
    }
}
