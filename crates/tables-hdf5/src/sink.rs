//! The HDF5 sink.

use std::collections::HashMap;
use std::path::Path;

use tables_core::{OpenMode, Sink, Table, TableResult};

use crate::codec::RowCodec;
use crate::error::{Hdf5Error, Hdf5Result};

/// A sink writing each bound table as a compound-type dataset in one HDF5
/// group.
///
/// Datasets are named after their table, 1-D, chunked, and extendible
/// without limit; each `emit_row` appends one record.  In
/// [`OpenMode::Truncate`] an existing same-name dataset is unlinked and
/// recreated at prolog; in [`OpenMode::Append`] an existing dataset is
/// reopened and its element type must equal the one computed from the
/// table's current columns.
///
/// The sink keeps the group (and, when it opened the file itself, the file)
/// handle alive for its whole lifetime; dropping the sink releases them.
pub struct Hdf5Sink {
    /// Keeps the file open when this sink created/opened it by path.
    _file: Option<hdf5::File>,
    group: hdf5::Group,
    mode: OpenMode,
    /// One codec per table with an open output session.
    codecs: HashMap<String, RowCodec>,
}

impl Hdf5Sink {
    /// Open `path` and place datasets in its root group.
    ///
    /// Truncate mode recreates the file; append mode opens it read-write,
    /// creating it when absent.
    pub fn create(path: impl AsRef<Path>, mode: OpenMode) -> Hdf5Result<Hdf5Sink> {
        let file = match mode {
            OpenMode::Truncate => hdf5::File::create(path)?,
            OpenMode::Append => hdf5::File::append(path)?,
        };
        let group = file.group("/")?;
        Ok(Hdf5Sink {
            _file: Some(file),
            group,
            mode,
            codecs: HashMap::new(),
        })
    }

    /// Place datasets in an existing group of an already-open file.
    pub fn in_group(group: hdf5::Group, mode: OpenMode) -> Hdf5Sink {
        Hdf5Sink {
            _file: None,
            group,
            mode,
            codecs: HashMap::new(),
        }
    }

    /// The group datasets are created in.
    pub fn group(&self) -> &hdf5::Group {
        &self.group
    }

    /// The open mode of this sink.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn prepare(&mut self, table: &Table) -> Hdf5Result<RowCodec> {
        let name = table.name();
        let mut codec = RowCodec::build(&table.columns())?;
        let loc = self.group.id();

        match self.mode {
            OpenMode::Append if self.group.link_exists(&name) => {
                codec.open_existing(loc, &name, &name)?;
            }
            OpenMode::Append => codec.create_dataset(loc, &name)?,
            OpenMode::Truncate => {
                if self.group.link_exists(&name) {
                    self.group.unlink(&name).map_err(Hdf5Error::from)?;
                }
                codec.create_dataset(loc, &name)?;
            }
        }
        Ok(codec)
    }
}

impl Sink for Hdf5Sink {
    fn output_prolog(&mut self, table: &Table) -> TableResult<()> {
        let codec = self.prepare(table)?;
        self.codecs.insert(table.name(), codec);
        Ok(())
    }

    fn output_row(&mut self, table: &Table) -> TableResult<()> {
        let name = table.name();
        let codec = self
            .codecs
            .get_mut(&name)
            .ok_or_else(|| Hdf5Error::NoSession(name.clone()))?;
        codec.append_row(&table.columns())?;
        Ok(())
    }

    fn output_epilog(&mut self, table: &Table) -> TableResult<()> {
        // Dropping the codec closes the dataset handle.
        self.codecs.remove(&table.name());
        Ok(())
    }
}
