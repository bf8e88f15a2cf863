//! The CSV text sink.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use tables_core::{OpenMode, Sink, Table, TableResult};

use crate::error::{TextError, TextResult};
use crate::stream::{MemBuffer, TextStream};

/// Row format written by a [`TextSink`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    /// Comma-separated values with a single header row of column names at
    /// the top of a fresh stream.  Ambiguous when several tables share one
    /// stream.
    CsvTab,
    /// Each row is prefixed with its table's name; no header.  Safe for
    /// multi-table streams.
    #[default]
    CsvRel,
}

impl TextFormat {
    /// The name used in sink URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            TextFormat::CsvTab => "csvtab",
            TextFormat::CsvRel => "csvrel",
        }
    }
}

/// A sink writing CSV text rows to a byte stream.
///
/// No quoting or escaping is performed: callers must keep commas and
/// newlines out of column names and string values.  Rows are LF-terminated
/// and numeric values are rendered through each column's own format string.
///
/// # Header emission (CsvTab)
///
/// A header row is written at a table's prolog when the stream is known to
/// be at physical offset 0, or when its position is unknown (stdout and
/// stderr).  Appending in CsvTab mode to a non-seekable stream that already
/// carries a header therefore duplicates the header — a documented quirk of
/// the format; use [`TextFormat::CsvRel`] for long-lived shared streams.
pub struct TextSink {
    writer: Writer<TextStream>,
    format: TextFormat,
    path: Option<PathBuf>,
    /// Stream position when the sink was opened; `None` when unknowable.
    start_pos: Option<u64>,
    /// Whether this sink has written anything through `writer`.
    wrote: bool,
    /// Tables with an open output session.
    sessions: HashSet<String>,
}

impl TextSink {
    /// Open (or create) `path` and write rows to it in `format`.
    pub fn create(
        path: impl AsRef<Path>,
        mode: OpenMode,
        format: TextFormat,
    ) -> TextResult<TextSink> {
        let path = path.as_ref();
        let file = match mode {
            OpenMode::Truncate => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
            OpenMode::Append => OpenOptions::new()
                .write(true)
                .create(true)
                .append(true)
                .open(path)?,
        };
        let start_pos = match mode {
            OpenMode::Truncate => Some(0),
            OpenMode::Append => Some(file.metadata()?.len()),
        };
        Ok(Self::over(
            TextStream::File(file),
            start_pos,
            format,
            Some(path.to_path_buf()),
        ))
    }

    /// A sink over the process standard output.
    pub fn stdout(format: TextFormat) -> TextSink {
        Self::over(TextStream::Stdout(io::stdout()), None, format, None)
    }

    /// A sink over the process standard error.
    pub fn stderr(format: TextFormat) -> TextSink {
        Self::over(TextStream::Stderr(io::stderr()), None, format, None)
    }

    /// A sink over an in-memory buffer, returned alongside a shared handle
    /// to its contents.
    pub fn memory(format: TextFormat) -> (TextSink, MemBuffer) {
        let buffer = MemBuffer::default();
        let sink = Self::over(TextStream::Memory(buffer.clone()), Some(0), format, None);
        (sink, buffer)
    }

    fn over(
        stream: TextStream,
        start_pos: Option<u64>,
        format: TextFormat,
        path: Option<PathBuf>,
    ) -> TextSink {
        let writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(stream);
        TextSink {
            writer,
            format,
            path,
            start_pos,
            wrote: false,
            sessions: HashSet::new(),
        }
    }

    /// The file this sink writes to, when it owns one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The row format of this sink.
    pub fn format(&self) -> TextFormat {
        self.format
    }

    fn header_due(&self) -> bool {
        match self.start_pos {
            None => true,
            Some(0) => !self.wrote,
            Some(_) => false,
        }
    }

    fn write_record(&mut self, fields: &[String]) -> TextResult<()> {
        self.writer.write_record(fields)?;
        self.wrote = true;
        self.writer.flush()?;
        Ok(())
    }
}

impl Sink for TextSink {
    fn output_prolog(&mut self, table: &Table) -> TableResult<()> {
        let name = table.name();
        if self.sessions.contains(&name) {
            return Ok(());
        }
        self.sessions.insert(name);

        if self.format == TextFormat::CsvTab && self.header_due() {
            let names: Vec<String> = table.columns().iter().map(|c| c.name()).collect();
            self.write_record(&names)?;
        }
        Ok(())
    }

    fn output_row(&mut self, table: &Table) -> TableResult<()> {
        let name = table.name();
        if !self.sessions.contains(&name) {
            return Err(TextError::NoSession(name).into());
        }

        let columns = table.columns();
        let values = columns.iter().map(|c| c.format_value());
        let fields: Vec<String> = match self.format {
            TextFormat::CsvTab => values.collect(),
            TextFormat::CsvRel => std::iter::once(name).chain(values).collect(),
        };
        self.write_record(&fields)?;
        Ok(())
    }

    fn output_epilog(&mut self, table: &Table) -> TableResult<()> {
        let name = table.name();
        if !self.sessions.remove(&name) {
            return Err(TextError::NoSession(name).into());
        }
        self.flush()
    }

    fn flush(&mut self) -> TableResult<()> {
        self.writer.flush().map_err(TextError::from)?;
        Ok(())
    }
}
