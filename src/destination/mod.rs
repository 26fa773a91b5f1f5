//! The write side of an install: where scheme-classified bytes land on disk.

pub mod scheme_dict;

use std::collections::HashMap;
use std::io::Read;

use crate::interpreter::Scheme;
use crate::launcher::Launcher;
use crate::record::RecordEntry;
use crate::Error;

/// Where an install writes files and finalizes the installed-file manifest.
///
/// A `Destination` sees only already-classified, already-validated content; scheme
/// resolution and launcher construction happen upstream in [`crate::engine`].
pub trait Destination {
    /// Tell the destination which scheme `.dist-info` (and therefore `RECORD`) is
    /// being placed under, per `WHEEL`'s `Root-Is-Purelib`. Must be called before any
    /// `write_file`/`write_script`/`finalize` call, since implementations may use it to
    /// resolve the base that other schemes' `RECORD` paths are written relative to.
    fn set_dist_info_scheme(&mut self, scheme: Scheme);

    /// Stream `reader` to disk under `scheme` at `path`, hashing as it copies.
    ///
    /// `executable` requests the POSIX executable permission bits on the written file;
    /// implementations that target a platform without that concept may ignore it.
    fn write_file(
        &mut self,
        scheme: Scheme,
        path: &str,
        reader: &mut dyn Read,
        executable: bool,
    ) -> Result<RecordEntry, Error>;

    /// Write a launcher produced by [`crate::launcher`], returning one `RECORD` entry
    /// per file it writes (one for POSIX, two — `.exe` and `.py` — for Windows).
    fn write_script(&mut self, launcher: Launcher) -> Result<Vec<RecordEntry>, Error>;

    /// Write any caller-supplied extra metadata files (e.g. an `INSTALLER` marker,
    /// keyed by filename relative to `.dist-info/`) and the terminal `RECORD` file
    /// itself, closing out the install.
    fn finalize(
        &mut self,
        dist_info_dir: &str,
        entries: Vec<RecordEntry>,
        extra_metadata: &HashMap<String, Vec<u8>>,
    ) -> Result<(), Error>;
}
