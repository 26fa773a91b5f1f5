//! The contract a wheel's contents are read through, independent of storage backend.
//!
//! A [`WheelSource`] exposes the `.dist-info` files an installer needs up front
//! ([`WheelSource::read_dist_info`]) and the rest of the archive as a one-shot,
//! lazily-read sequence ([`WheelSource::for_each_entry`]). It is a visitor rather than
//! an [`Iterator`] because the only real backend (a `zip::ZipArchive`) can only hand out
//! one borrowed entry reader at a time — `by_index_raw`/`by_name` borrow the archive
//! mutably for the reader's lifetime, which an `Iterator::Item` can't express without
//! GATs. A visitor closure sidesteps that: each call gets its entry, does its work, and
//! returns before the next entry is opened.

pub mod zip;

use std::io::Read;

use crate::interpreter::Scheme;
use crate::Error;

/// One non-`.dist-info` member of a wheel archive, already classified by scheme.
pub struct WheelEntry<'a> {
    /// The member's path exactly as it appears in the archive, used to look it up in
    /// the wheel's own shipped `RECORD` for hash/size verification.
    pub archive_path: String,
    /// Path relative to the destination scheme's root (the `.data/<scheme>/` prefix,
    /// or the purelib/platlib root prefix, has already been stripped).
    pub dest_path: String,
    pub scheme: Scheme,
    /// Whether the source marks this entry executable (POSIX permission bits).
    pub executable: bool,
    pub reader: &'a mut dyn Read,
}

/// Read access to a wheel's contents, lazily and in one pass.
///
/// Implementations may assume [`WheelSource::validate`] is called first; callers that
/// skip it get unspecified (but safe) behavior from the other methods.
pub trait WheelSource {
    /// The `{name}-{version}.dist-info` directory name this source resolved to.
    fn dist_info_dir(&self) -> &str;

    /// Validate archive layout: exactly one `.dist-info` directory matching the
    /// filename-derived name/version, containing both `WHEEL` and `RECORD`, and every
    /// path `RECORD` lists (other than `RECORD`'s own row) actually present as an
    /// archive member. The reverse — archive members absent from `RECORD` — is allowed
    /// and not checked here; only a `RECORD` that promises more than the archive
    /// contains is a hard error.
    fn validate(&mut self) -> Result<(), Error>;

    /// Tell the source whether `WHEEL` declared `Root-Is-Purelib: true`, so it can
    /// classify non-`.data/` entries as `purelib` or `platlib`. Must be called after
    /// the caller parses `WHEEL` and before [`WheelSource::for_each_entry`].
    fn set_root_is_purelib(&mut self, root_is_purelib: bool);

    /// Read one `.dist-info`-relative file whole, e.g. `"WHEEL"`, `"RECORD"`,
    /// `"entry_points.txt"`. Returns `Ok(None)` for an optional file that is absent.
    fn read_dist_info(&mut self, name: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Names (relative to the `.dist-info` directory, `RECORD` excluded) of every file
    /// shipped under it — `METADATA`, `WHEEL`, `entry_points.txt`, `LICENSE`, etc.
    /// These install verbatim; only `RECORD` itself is regenerated.
    fn dist_info_members(&mut self) -> Result<Vec<String>, Error>;

    /// Visit every archive member outside `.dist-info/` exactly once, in archive order,
    /// classified by destination scheme.
    ///
    /// Members under `.data/<name>/scripts/` are included like any other entry, scheme
    /// [`Scheme::Scripts`]; callers that want launcher rewriting for a qualifying
    /// shebang (see [`crate::launcher::qualifies_for_rewrite`]) apply it themselves —
    /// the source only classifies, it doesn't transform.
    fn for_each_entry(
        &mut self,
        visitor: impl FnMut(WheelEntry<'_>) -> Result<(), Error>,
    ) -> Result<(), Error>;
}
