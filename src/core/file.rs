// Scoped file access for table reads and writes; handles are dropped before returning.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::codec;
use crate::core::error::{Error, ErrorKind};
use crate::core::table::Table;

pub fn read_table(path: &Path) -> Result<Table, Error> {
    let file = File::open(path).map_err(|err| {
        let kind = err.kind();
        let err = Error::from_io(err, path).with_message("cannot open table for reading");
        if kind == std::io::ErrorKind::NotFound {
            err.with_hint("Check the input path; nothing exists at that location.")
        } else {
            err
        }
    })?;
    codec::decode_reader(BufReader::new(file))
        .map_err(|err| Error::from_io(err, path).with_message("failed to read table"))
}

/// Encode `table` and write it to `path`, replacing existing content.
///
/// The table is encoded before the file is touched, so an `EmptyTable` error
/// leaves the location as it was. A failed write removes the partial file.
pub fn write_table(path: &Path, table: &Table) -> Result<(), Error> {
    let text = codec::encode_to_string(table).map_err(|err| err.with_path(path))?;
    write_bytes(path, text.as_bytes())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let file = File::create(path).map_err(|err| {
        Error::from_io(err, path).with_message("cannot open table for writing")
    })?;
    let guard = PartialFile::new(path);
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|err| Error::from_io(err, path).with_message("failed to write table"))?;
    guard.commit();
    Ok(())
}

/// Removes a half-written file on drop unless committed.
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let _ = fs::remove_file(&self.path);
    }
}

/// Remove whatever exists at `path` (file or directory). Missing is fine.
pub fn remove_existing(path: &Path) -> Result<(), Error> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => Err(err),
    };
    result.map_err(|err| {
        Error::from_io(err, path).with_message("cannot replace existing output")
    })
}

pub(crate) fn not_a_table(path: &Path) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("location is not a readable table file")
        .with_path(path)
}
