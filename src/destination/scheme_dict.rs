//! [`Destination`] backed by a plain scheme-to-directory map on the local filesystem.
//!
//! Writes go through a temp-file-then-rename dance (`tempfile::NamedTempFile` in the
//! target directory, persisted over the final path) so a crash or Ctrl-C mid-install
//! never leaves a half-written file at its final name.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::hash::{Hash, HashAlgorithm};
use crate::interpreter::Scheme;
use crate::launcher::Launcher;
use crate::record::RecordEntry;
use crate::Error;

/// Compute `target`'s path relative to `base`, using `..` to climb where needed.
///
/// Both paths are assumed absolute and lexically comparable (no symlinks to resolve);
/// this only walks components, it never touches the filesystem.
fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<_> = base.components().collect();
    let target_components: Vec<_> = target.components().collect();
    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_components.len() {
        result.push("..");
    }
    for component in &target_components[common..] {
        result.push(component);
    }
    result
}

fn write_atomically(path: &Path, contents: &[u8], executable: bool) -> Result<(), Error> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs_err::create_dir_all(parent).map_err(Error::Io)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(Error::Io)?;
    {
        use std::io::Write;
        tmp.write_all(contents).map_err(Error::Io)?;
    }

    #[cfg(unix)]
    if executable {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o755))
            .map_err(Error::Io)?;
    }
    #[cfg(not(unix))]
    let _ = executable;

    tmp.persist(path).map_err(|err| Error::Destination {
        path: path.display().to_string(),
        source: err.error,
    })?;
    Ok(())
}

/// Like [`write_atomically`], but streams `reader` straight into the temp file while
/// hashing rather than buffering its content first, so installing a multi-gigabyte
/// wheel member never holds the whole file in memory at once.
fn write_atomically_streamed(
    path: &Path,
    reader: &mut dyn Read,
    executable: bool,
    algorithm: HashAlgorithm,
) -> Result<(u64, Hash), Error> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs_err::create_dir_all(parent).map_err(Error::Io)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(Error::Io)?;
    let (size, hash) = crate::hash::copy_and_hash(reader, tmp.as_file_mut(), algorithm).map_err(Error::Io)?;

    #[cfg(unix)]
    if executable {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o755))
            .map_err(Error::Io)?;
    }
    #[cfg(not(unix))]
    let _ = executable;

    tmp.persist(path).map_err(|err| Error::Destination {
        path: path.display().to_string(),
        source: err.error,
    })?;
    Ok((size, hash))
}

/// A [`Destination`] that writes each scheme to a fixed, pre-resolved directory.
pub struct SchemeDestination {
    roots: HashMap<Scheme, PathBuf>,
    algorithm: HashAlgorithm,
    /// The scheme `.dist-info`/`RECORD` live under; `RECORD` paths for every other
    /// scheme are written relative to this root. Defaults to `Purelib`, the common
    /// case, until [`Destination::set_dist_info_scheme`] says otherwise.
    dist_info_scheme: Scheme,
}

impl SchemeDestination {
    pub fn new(roots: HashMap<Scheme, PathBuf>) -> Self {
        Self {
            roots,
            algorithm: HashAlgorithm::default(),
            dist_info_scheme: Scheme::Purelib,
        }
    }

    fn root(&self, scheme: Scheme) -> Result<&PathBuf, Error> {
        self.roots.get(&scheme).ok_or_else(|| {
            Error::Destination {
                path: scheme.as_str().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no destination directory configured for scheme `{}`", scheme.as_str()),
                ),
            }
        })
    }

    /// The `RECORD` path for a file written under `scheme` at `path`, relative to the
    /// directory `RECORD` itself lives under (the scheme `.dist-info` was placed in).
    fn record_path(&self, scheme: Scheme, path: &str) -> Result<String, Error> {
        if scheme == self.dist_info_scheme {
            return Ok(path.replace('\\', "/"));
        }
        let root = self.root(scheme)?;
        let absolute = root.join(path);
        let record_base = self.root(self.dist_info_scheme)?;
        Ok(relative_to(record_base, &absolute).to_string_lossy().replace('\\', "/"))
    }
}

impl super::Destination for SchemeDestination {
    fn set_dist_info_scheme(&mut self, scheme: Scheme) {
        self.dist_info_scheme = scheme;
    }

    fn write_file(
        &mut self,
        scheme: Scheme,
        path: &str,
        reader: &mut dyn Read,
        executable: bool,
    ) -> Result<RecordEntry, Error> {
        let target = self.root(scheme)?.join(path);
        debug!(path = %target.display(), "writing file");
        let (size, hash) = write_atomically_streamed(&target, reader, executable, self.algorithm)?;

        let record_path = self.record_path(scheme, path)?;
        Ok(RecordEntry {
            path: record_path,
            hash: Some(hash),
            size: Some(size),
        })
    }

    fn write_script(&mut self, launcher: Launcher) -> Result<Vec<RecordEntry>, Error> {
        let scripts_root = self.root(Scheme::Scripts)?.clone();
        let mut written = Vec::new();
        match launcher {
            Launcher::Posix { name, content } => {
                let target = scripts_root.join(&name);
                write_atomically(&target, content.as_bytes(), true)?;
                let record_path = relative_to(self.root(self.dist_info_scheme)?, &target)
                    .to_string_lossy()
                    .replace('\\', "/");
                written.push(RecordEntry::for_content(record_path, content.as_bytes(), self.algorithm));
            }
            Launcher::Windows { name, exe, script_py } => {
                let exe_path = scripts_root.join(format!("{name}.exe"));
                write_atomically(&exe_path, &exe, true)?;
                let exe_record = relative_to(self.root(self.dist_info_scheme)?, &exe_path)
                    .to_string_lossy()
                    .replace('\\', "/");
                written.push(RecordEntry::for_content(exe_record, &exe, self.algorithm));

                let py_path = scripts_root.join(format!("{name}-script.py"));
                write_atomically(&py_path, script_py.as_bytes(), false)?;
                let py_record = relative_to(self.root(self.dist_info_scheme)?, &py_path)
                    .to_string_lossy()
                    .replace('\\', "/");
                written.push(RecordEntry::for_content(py_record, script_py.as_bytes(), self.algorithm));
            }
        }
        Ok(written)
    }

    fn finalize(
        &mut self,
        dist_info_dir: &str,
        mut entries: Vec<RecordEntry>,
        extra_metadata: &HashMap<String, Vec<u8>>,
    ) -> Result<(), Error> {
        let dist_info_root = self.root(self.dist_info_scheme)?.join(dist_info_dir);
        let mut names: Vec<&String> = extra_metadata.keys().collect();
        names.sort();
        for name in names {
            let contents = &extra_metadata[name];
            let target = dist_info_root.join(name);
            debug!(path = %target.display(), "writing extra metadata");
            write_atomically(&target, contents, false)?;
            let record_path = format!("{dist_info_dir}/{name}");
            entries.push(RecordEntry::for_content(record_path, contents, self.algorithm));
        }

        entries.push(RecordEntry::terminal(format!("{dist_info_dir}/RECORD")));
        entries.sort();

        let mut buffer = Vec::new();
        crate::record::serialize_record(&entries, &mut buffer)?;

        let record_path = self.root(self.dist_info_scheme)?.join(dist_info_dir).join("RECORD");
        write_atomically(&record_path, &buffer, false)?;
        Ok(())
    }
}
