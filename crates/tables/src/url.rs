//! The URL factory for output sinks.
//!
//! Grammar: `type:path?key1=value1,key2=value2`
//!
//! | `type`   | Sink                                   | Recognized keys        |
//! |----------|----------------------------------------|------------------------|
//! | `file`   | [`TextSink`] on `path`                 | `open_mode`, `format`  |
//! | `hdf5`   | [`Hdf5Sink`] on `path`                 | `open_mode`            |
//! | `stdout` | the process-global stdout sink         | —                      |
//! | `stderr` | the process-global stderr sink         | —                      |
//!
//! `open_mode ∈ {append, truncate}` (default `truncate`) and
//! `format ∈ {csvtab, csvrel}` (default `csvrel`).  An unknown `type` or an
//! unknown value for a recognized key fails; unrecognized keys are ignored.
//! `stdout:`/`stderr:` return clones of thread-local process sinks whose
//! format is fixed at first use, so `format` has no effect on them.

use tables_core::{OpenMode, SinkHandle, TableError, TableResult};
use tables_text::{TextFormat, TextSink};

#[cfg(feature = "hdf5")]
use tables_hdf5::Hdf5Sink;

thread_local! {
    static STDOUT_SINK: SinkHandle =
        SinkHandle::new(TextSink::stdout(TextFormat::default()));
    static STDERR_SINK: SinkHandle =
        SinkHandle::new(TextSink::stderr(TextFormat::default()));
}

/// The process-global stdout sink (CsvRel format).
pub fn stdout_sink() -> SinkHandle {
    STDOUT_SINK.with(Clone::clone)
}

/// The process-global stderr sink (CsvRel format).
pub fn stderr_sink() -> SinkHandle {
    STDERR_SINK.with(Clone::clone)
}

/// Open a sink described by `url` (see the module docs for the grammar).
pub fn open_sink(url: &str) -> TableResult<SinkHandle> {
    let parsed = parse_url(url)?;

    let mut mode = OpenMode::default();
    let mut format = TextFormat::default();
    for (key, value) in &parsed.params {
        match key.as_str() {
            "open_mode" => {
                mode = match value.as_str() {
                    "truncate" => OpenMode::Truncate,
                    "append" => OpenMode::Append,
                    _ => {
                        return Err(TableError::BadUrlValue {
                            key: "open_mode",
                            value: value.clone(),
                        })
                    }
                }
            }
            "format" => {
                format = match value.as_str() {
                    "csvtab" => TextFormat::CsvTab,
                    "csvrel" => TextFormat::CsvRel,
                    _ => {
                        return Err(TableError::BadUrlValue {
                            key: "format",
                            value: value.clone(),
                        })
                    }
                }
            }
            // Unrecognized keys are ignored.
            _ => {}
        }
    }

    match parsed.scheme.as_str() {
        "file" => Ok(SinkHandle::new(
            TextSink::create(&parsed.path, mode, format).map_err(TableError::from)?,
        )),
        #[cfg(feature = "hdf5")]
        "hdf5" => Ok(SinkHandle::new(
            Hdf5Sink::create(&parsed.path, mode).map_err(TableError::from)?,
        )),
        "stdout" => Ok(stdout_sink()),
        "stderr" => Ok(stderr_sink()),
        other => Err(TableError::UnknownSinkType(other.to_string())),
    }
}

pub(crate) struct ParsedUrl {
    pub(crate) scheme: String,
    pub(crate) path: String,
    pub(crate) params: Vec<(String, String)>,
}

/// Split `type:path?k=v,…` into its parts, validating shape only.
pub(crate) fn parse_url(url: &str) -> TableResult<ParsedUrl> {
    let malformed = || TableError::MalformedUrl(url.to_string());

    let (scheme, rest) = url.split_once(':').ok_or_else(malformed)?;
    if !is_identifier(scheme) {
        return Err(malformed());
    }

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut params = Vec::new();
    if let Some(query) = query {
        for pair in query.split(',').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(malformed)?;
            if !is_identifier(key) || value.is_empty() {
                return Err(malformed());
            }
            params.push((key.to_string(), value.to_string()));
        }
    }

    Ok(ParsedUrl {
        scheme: scheme.to_string(),
        path: path.to_string(),
        params,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
