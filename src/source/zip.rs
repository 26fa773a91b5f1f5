//! [`super::WheelSource`] backed by a `zip::ZipArchive`, the only wheel storage format.

use std::io::{Read, Seek};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::filename::WheelFilename;
use crate::interpreter::Scheme;
use crate::Error;

use super::{WheelEntry, WheelSource};

/// A wheel opened straight from its `.whl` ZIP archive.
pub struct ZipWheelSource<R: Read + Seek> {
    archive: ZipArchive<R>,
    dist_info_dir: String,
    data_dir: String,
    root_is_purelib: bool,
}

impl<R: Read + Seek> ZipWheelSource<R> {
    /// Open `reader` as a wheel whose filename parsed to `expected`.
    ///
    /// Scans the archive's name list for a single top-level `.dist-info` directory and
    /// requires it to match `expected.dist_info_dir()` exactly; wheels with zero, two,
    /// or a mismatched `.dist-info` directory are rejected here rather than later.
    pub fn new(reader: R, expected: &WheelFilename) -> Result<Self, Error> {
        let archive = ZipArchive::new(reader).map_err(Error::Zip)?;
        let wanted = expected.dist_info_dir();

        let mut found: Vec<String> = archive
            .file_names()
            .filter_map(|name| name.split('/').next())
            .filter(|top| top.ends_with(".dist-info"))
            .map(str::to_string)
            .collect();
        found.sort_unstable();
        found.dedup();

        let dist_info_dir = match found.as_slice() {
            [single] if single == &wanted => single.clone(),
            [] => {
                return Err(Error::InvalidWheelSource(
                    std::path::PathBuf::new(),
                    "no *.dist-info directory found".to_string(),
                ))
            }
            [single] => {
                return Err(Error::InvalidWheelSource(
                    std::path::PathBuf::new(),
                    format!("found `{single}`, expected `{wanted}`"),
                ))
            }
            multiple => {
                return Err(Error::InvalidWheelSource(
                    std::path::PathBuf::new(),
                    format!("multiple .dist-info directories: {}", multiple.join(", ")),
                ))
            }
        };

        let data_dir = format!(
            "{}.data",
            dist_info_dir.trim_end_matches(".dist-info")
        );

        Ok(Self {
            archive,
            dist_info_dir,
            data_dir,
            root_is_purelib: false,
        })
    }

}

impl<R: Read + Seek> WheelSource for ZipWheelSource<R> {
    fn dist_info_dir(&self) -> &str {
        &self.dist_info_dir
    }

    fn set_root_is_purelib(&mut self, root_is_purelib: bool) {
        self.root_is_purelib = root_is_purelib;
    }

    fn validate(&mut self) -> Result<(), Error> {
        for required in ["WHEEL", "RECORD"] {
            if self.read_dist_info(required)?.is_none() {
                return Err(Error::InvalidWheelSource(
                    std::path::PathBuf::new(),
                    format!("`{}/{required}` is missing", self.dist_info_dir),
                ));
            }
        }

        // Every path RECORD lists, other than RECORD's own row, must be an archive
        // member. A RECORD that promises a file the archive never shipped would
        // otherwise install silently fewer files than it claims to, with no error or
        // warning from anywhere downstream — `for_each_entry` only walks what's actually
        // in the archive, it never cross-checks against RECORD's path set.
        let record_bytes = self
            .read_dist_info("RECORD")?
            .expect("checked present above");
        let record_path = format!("{}/RECORD", self.dist_info_dir);
        let names: std::collections::HashSet<&str> = self.archive.file_names().collect();
        for row in crate::record::parse_record(&mut record_bytes.as_slice())? {
            if row.path == record_path {
                continue;
            }
            if !names.contains(row.path.as_str()) {
                return Err(Error::InvalidWheelSource(
                    std::path::PathBuf::new(),
                    format!("RECORD lists `{}` but the archive does not contain it", row.path),
                ));
            }
        }
        Ok(())
    }

    fn read_dist_info(&mut self, name: &str) -> Result<Option<Vec<u8>>, Error> {
        let path = format!("{}/{name}", self.dist_info_dir);
        match self.archive.by_name(&path) {
            Ok(mut file) => {
                let mut buf = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut buf).map_err(Error::Io)?;
                Ok(Some(buf))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(Error::Zip(err)),
        }
    }

    fn dist_info_members(&mut self) -> Result<Vec<String>, Error> {
        let prefix = format!("{}/", self.dist_info_dir);
        let mut members: Vec<String> = self
            .archive
            .file_names()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty() && !rest.ends_with('/'))
            .filter(|rest| *rest != "RECORD")
            .map(str::to_string)
            .collect();
        members.sort_unstable();
        Ok(members)
    }

    fn for_each_entry(
        &mut self,
        mut visitor: impl FnMut(WheelEntry<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let dist_info_prefix = format!("{}/", self.dist_info_dir);
        let data_prefix = format!("{}/", self.data_dir);

        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i).map_err(Error::Zip)?;
            let name = file.name().to_string();

            if name.ends_with('/') {
                continue;
            }
            if name.starts_with(&dist_info_prefix) {
                continue;
            }

            let executable = file.unix_mode().map(|mode| mode & 0o111 != 0).unwrap_or(false);

            let (scheme, dest_path) = if let Some(rest) = name.strip_prefix(&data_prefix) {
                let (scheme_name, rest) = rest.split_once('/').ok_or_else(|| {
                    Error::InvalidWheelSource(
                        std::path::PathBuf::new(),
                        format!("`{name}` is directly inside `.data/`, expected `.data/<scheme>/...`"),
                    )
                })?;
                let scheme = Scheme::from_str(scheme_name).ok_or_else(|| {
                    Error::InvalidWheelSource(
                        std::path::PathBuf::new(),
                        format!("unknown installation scheme `{scheme_name}` in `{name}`"),
                    )
                })?;
                (scheme, rest.to_string())
            } else {
                let scheme = if self.root_is_purelib {
                    Scheme::Purelib
                } else {
                    Scheme::Platlib
                };
                (scheme, name.clone())
            };

            debug!(path = %name, scheme = scheme.as_str(), "visiting wheel entry");
            visitor(WheelEntry {
                archive_path: name.clone(),
                dest_path,
                scheme,
                executable,
                reader: &mut file,
            })?;
        }
        Ok(())
    }
}
