// Row-oriented backend: the text codec applied directly to files.
use tracing::debug;

use super::{Location, TableBackend};
use crate::core::error::Error;
use crate::core::file;
use crate::core::table::Table;

#[derive(Clone, Copy, Debug, Default)]
pub struct RecordBackend;

impl RecordBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TableBackend for RecordBackend {
    type Table = Table;

    fn name(&self) -> &'static str {
        "records"
    }

    fn read(&self, location: &Location) -> Result<Table, Error> {
        let table = file::read_table(location.as_path())?;
        debug!(%location, records = table.len(), "read table");
        Ok(table)
    }

    fn write(&self, table: Table, location: &Location) -> Result<(), Error> {
        let records = table.len();
        file::write_table(location.as_path(), &table)?;
        debug!(%location, records, "wrote table");
        Ok(())
    }
}
