//! Purpose: Column-major table backend for single-process analytical use.
//! Exports: `ColumnarBackend`, `ColumnarTable`.
//! Role: Same file format as `RecordBackend`, different in-memory layout.
//! Invariants: Every column holds exactly `row_count` values.
//! Invariants: Writes emit the header and rows only; no index column is added.
use tracing::debug;

use super::{Location, TableBackend};
use crate::core::error::{Error, ErrorKind};
use crate::core::file;
use crate::core::table::{Record, Schema, Table, TableLike};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColumnarTable {
    schema: Option<Schema>,
    columns: Vec<Vec<String>>,
    row_count: usize,
}

impl ColumnarTable {
    pub fn from_table(table: Table) -> Self {
        let (schema, records) = table.into_parts();
        let Some(schema) = schema else {
            return Self::default();
        };
        let row_count = records.len();
        let mut columns: Vec<Vec<String>> = (0..schema.len())
            .map(|_| Vec::with_capacity(row_count))
            .collect();
        for record in records {
            for (column, value) in columns.iter_mut().zip(record.into_values()) {
                column.push(value);
            }
        }
        Self {
            schema: Some(schema),
            columns,
            row_count,
        }
    }

    pub fn into_table(self) -> Table {
        let Some(schema) = self.schema else {
            return Table::empty();
        };
        let mut cursors: Vec<_> = self.columns.into_iter().map(Vec::into_iter).collect();
        let records = (0..self.row_count)
            .map(|_| Record::new(cursors.iter_mut().filter_map(Iterator::next)))
            .collect();
        Table::from_parts(schema, records)
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Values of the first column called `name`.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        let idx = self.schema.as_ref()?.position(name)?;
        Some(&self.columns[idx])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.schema
            .iter()
            .flat_map(|schema| schema.fields())
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Return a table with `name` replaced (first match) or appended.
    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Self, Error> {
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("column name is empty"));
        }
        let Some(schema) = self.schema.take() else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("cannot add a column to a table without a schema"));
        };
        if values.len() != self.row_count {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "column {name} has {} values but table has {} rows",
                values.len(),
                self.row_count
            )));
        }
        match schema.position(name) {
            Some(idx) => {
                self.columns[idx] = values;
                self.schema = Some(schema);
            }
            None => {
                let mut fields = schema.fields().to_vec();
                fields.push(name.to_string());
                self.columns.push(values);
                self.schema = Some(Schema::new(fields));
            }
        }
        Ok(self)
    }
}

impl TableLike for ColumnarTable {
    fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    fn record_count(&self) -> usize {
        self.row_count
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ColumnarBackend;

impl ColumnarBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TableBackend for ColumnarBackend {
    type Table = ColumnarTable;

    fn name(&self) -> &'static str {
        "columnar"
    }

    fn read(&self, location: &Location) -> Result<ColumnarTable, Error> {
        let table = ColumnarTable::from_table(file::read_table(location.as_path())?);
        debug!(
            %location,
            columns = table.columns.len(),
            rows = table.row_count,
            "read columnar table"
        );
        Ok(table)
    }

    fn write(&self, table: ColumnarTable, location: &Location) -> Result<(), Error> {
        let rows = table.row_count;
        file::write_table(location.as_path(), &table.into_table())?;
        debug!(%location, rows, "wrote columnar table");
        Ok(())
    }
}
