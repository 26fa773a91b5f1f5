//! `RECORD` codec: parsing, hash/size validation, and serialization.
//!
//! <https://www.python.org/dev/peps/pep-0376/#record>
//!
//! ```csv
//! tqdm/cli.py,sha256=x_c8nmc4Huc-lKEsAXj78ZiyqSJ9hJ71j7vltY67icw,10509
//! tqdm-4.62.3.dist-info/RECORD,,
//! ```

use std::io::{Read, Write};

use crate::hash::{digest, Hash, HashAlgorithm};
use crate::Error;

/// A single `RECORD` row in its raw textual form, before `hash`/`size` are interpreted.
///
/// Keeping `hash`/`size` as strings (rather than `Option<Hash>`/`Option<u64>`) lets a
/// reader distinguish "empty field" from "zero" without losing information — the two
/// mean different things for a directory placeholder versus a zero-byte file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRow {
    path: String,
    hash: String,
    size: String,
}

/// A line in a `RECORD` file, normalized into typed fields.
///
/// `hash` and `size` are both present for regular installed files and both absent for
/// directory placeholders and the `RECORD` file's own row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RecordEntry {
    pub path: String,
    pub hash: Option<Hash>,
    pub size: Option<u64>,
}

impl RecordEntry {
    /// A terminal row: empty hash, empty size. Used for the `RECORD` file's own entry.
    pub fn terminal(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: None,
            size: None,
        }
    }

    /// Build an entry from file content, computing its hash under `algorithm`.
    pub fn for_content(path: impl Into<String>, content: &[u8], algorithm: HashAlgorithm) -> Self {
        Self {
            path: path.into(),
            hash: Some(Hash {
                algorithm: algorithm.name().to_string(),
                digest: digest(algorithm, content),
            }),
            size: Some(content.len() as u64),
        }
    }
}

fn to_raw(entry: &RecordEntry) -> RawRow {
    RawRow {
        path: entry.path.replace('\\', "/"),
        hash: entry.hash.as_ref().map(Hash::to_field).unwrap_or_default(),
        size: entry.size.map(|s| s.to_string()).unwrap_or_default(),
    }
}

fn from_raw(raw: RawRow, line: usize) -> Result<RecordEntry, Error> {
    if raw.hash.is_empty() != raw.size.is_empty() {
        return Err(Error::InvalidRecordEntry {
            line,
            content: format!("{},{},{}", raw.path, raw.hash, raw.size),
        });
    }
    let hash = if raw.hash.is_empty() {
        None
    } else {
        Some(Hash::parse(&raw.hash).map_err(|_| Error::InvalidRecordEntry {
            line,
            content: raw.hash.clone(),
        })?)
    };
    let size = if raw.size.is_empty() {
        None
    } else {
        Some(raw.size.parse::<u64>().map_err(|_| Error::InvalidRecordEntry {
            line,
            content: raw.size.clone(),
        })?)
    };
    Ok(RecordEntry {
        // Selenium, among others, has historically written absolute paths for some rows.
        path: raw.path.trim_start_matches('/').to_string(),
        hash,
        size,
    })
}

/// Parse a `RECORD` file into its entries, preserving row order.
///
/// Malformed rows (wrong arity or unparseable CSV) fail with [`Error::InvalidRecordEntry`],
/// identifying the 1-based line number and the offending content.
pub fn parse_record(reader: &mut impl Read) -> Result<Vec<RecordEntry>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .escape(Some(b'"'))
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|err| Error::RecordCsv {
            line: line + 1,
            source: err,
        })?;
        let fields: Vec<&str> = record.iter().collect();
        let [path, hash, size] = fields[..] else {
            return Err(Error::InvalidRecordEntry {
                line: line + 1,
                content: fields.join(","),
            });
        };
        let raw = RawRow {
            path: path.to_string(),
            hash: hash.to_string(),
            size: size.to_string(),
        };
        entries.push(from_raw(raw, line + 1)?);
    }
    Ok(entries)
}

/// Verify that `entry` matches `buffer`: the hash (if present) and the size (if present).
///
/// An entry with no hash skips hash verification by design (directory placeholders and
/// the `RECORD` row itself never carry one); this never returns an error, only `bool`.
pub fn validate_entry(entry: &RecordEntry, buffer: &[u8]) -> bool {
    if let Some(size) = entry.size {
        if size != buffer.len() as u64 {
            return false;
        }
    }
    if let Some(hash) = &entry.hash {
        return crate::hash::validate(hash, buffer);
    }
    true
}

/// Serialize `entries` as `RECORD` CSV: comma-delimited, quoting only when a field
/// contains a comma, quote, or CR/LF, forward-slash paths, trailing newline on every row.
pub fn serialize_record(entries: &[RecordEntry], writer: &mut impl Write) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .escape(b'"')
        .from_writer(writer);
    for entry in entries {
        let raw = to_raw(entry);
        wtr.write_record([raw.path.as_str(), raw.hash.as_str(), raw.size.as_str()])
            .map_err(|err| Error::RecordCsv { line: 0, source: err })?;
    }
    wtr.flush().map_err(Error::Io)?;
    Ok(())
}
