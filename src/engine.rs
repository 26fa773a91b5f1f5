//! Orchestrates [`crate::source`], [`crate::destination`], [`crate::launcher`] and
//! [`crate::record`] into a single wheel install.
//!
//! Generic over both traits (static dispatch, no `dyn`): [`crate::source::WheelSource`]
//! and [`crate::destination::Destination`]'s streaming methods take `impl FnMut`/`impl
//! Read` arguments that aren't object-safe, so a trait-object engine isn't an option
//! without boxing every closure at every call site.

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, debug_span, warn};

use crate::destination::Destination;
use crate::entry_points::{parse_entry_points, Script};
use crate::filename::WheelFilename;
use crate::hash::AllowList;
use crate::interpreter::Interpreter;
use crate::launcher::{self, Launcher};
use crate::record::{self, RecordEntry};
use crate::source::WheelSource;
use crate::wheel_metadata::WheelMetadata;
use crate::Error;

/// Check a just-written entry against whatever row `archive_path` has in the wheel's
/// own shipped `RECORD`, if any. A member with no row is logged and allowed through:
/// `RECORD` is only required to be complete enough to cover `.dist-info`'s own
/// required files, and `pip` itself has historically tolerated under-complete
/// `RECORD`s from other tools.
///
/// Compares against `written` — the `RecordEntry` the destination actually produced —
/// rather than re-hashing the archive member's bytes a second time: the destination
/// already hashed the exact bytes it streamed from the archive while writing them, so
/// a second, engine-side pass would either re-buffer the whole file (defeating the
/// point of streaming a multi-gigabyte member) or re-read it from disk.
fn verify_against_shipped_record(
    shipped_record: &[record::RecordEntry],
    allow_list: &AllowList,
    archive_path: &str,
    written: &RecordEntry,
) -> Result<(), Error> {
    let Some(row) = shipped_record.iter().find(|row| row.path == archive_path) else {
        warn!(path = %archive_path, "archive member has no RECORD entry");
        return Ok(());
    };
    if let Some(expected_size) = row.size {
        if Some(expected_size) != written.size {
            return Err(Error::RecordMismatch {
                path: archive_path.to_string(),
                reason: format!(
                    "RECORD declares size {expected_size}, installed file is {:?} bytes",
                    written.size
                ),
            });
        }
    }
    let Some(expected_hash) = &row.hash else {
        return Ok(());
    };
    if !allow_list.is_allowed(&expected_hash.algorithm) {
        warn!(path = %archive_path, algorithm = %expected_hash.algorithm, "hash algorithm not in allow-list, skipping verification");
        return Ok(());
    }
    match &written.hash {
        Some(actual_hash) if actual_hash.algorithm == expected_hash.algorithm => {
            if actual_hash.digest == expected_hash.digest {
                Ok(())
            } else {
                Err(Error::RecordMismatch {
                    path: archive_path.to_string(),
                    reason: "content does not match RECORD hash".to_string(),
                })
            }
        }
        _ => {
            // The destination hashes under its own configured algorithm (`sha256` by
            // default), which may not be the algorithm the shipped `RECORD` used.
            // Re-verifying under a different algorithm would mean hashing the file a
            // second time; this crate only trades that cost for a hard guarantee when
            // the two algorithms already agree, which is true for every wheel built by
            // a standard tool.
            warn!(path = %archive_path, "installed file's hash algorithm differs from RECORD's, skipping verification");
            Ok(())
        }
    }
}

fn build_launcher(script: &Script, interpreter: &Interpreter) -> Result<Launcher, Error> {
    let executable = interpreter.executable.to_string_lossy().into_owned();
    match interpreter.windows_arch {
        Some(arch) => launcher::build_windows(script, &executable, arch),
        None => launcher::build_posix(script, &executable),
    }
}

fn build_data_script_launcher(
    name: &str,
    bytes: &[u8],
    interpreter: &Interpreter,
    interpreter_basename: &str,
) -> Result<Launcher, Error> {
    let executable = interpreter.executable.to_string_lossy().into_owned();
    launcher::rewrite_data_script(name, bytes, &executable, interpreter_basename, interpreter.windows_arch)
}

/// Install a wheel from `source` into `destination`, targeting `interpreter`.
///
/// `additional_metadata` is written verbatim into `.dist-info/` during finalize (e.g.
/// an `INSTALLER` file naming the installing tool); pass an empty map if the caller has
/// nothing to add.
///
/// Aborts before writing anything to `destination` if the wheel's format version is
/// unsupported or its archive layout is invalid; aborts mid-install, leaving whatever
/// has already been written in place, on a `RECORD` hash/size mismatch — this crate
/// does not attempt to roll back partial installs, matching the non-transactional
/// nature of a plain filesystem.
pub fn install<S: WheelSource, D: Destination>(
    source: &mut S,
    destination: &mut D,
    interpreter: &Interpreter,
    filename: &WheelFilename,
    allow_list: &AllowList,
    additional_metadata: &HashMap<String, Vec<u8>>,
) -> Result<(), Error> {
    let _span = debug_span!("install", distribution = %filename.distribution, version = %filename.version).entered();

    source.validate()?;

    let wheel_bytes = source
        .read_dist_info("WHEEL")?
        .expect("validate() guarantees WHEEL is present");
    let metadata = WheelMetadata::parse(&wheel_bytes)?;
    debug!(wheel_version = %metadata.wheel_version, root_is_purelib = metadata.root_is_purelib, "parsed WHEEL");
    source.set_root_is_purelib(metadata.root_is_purelib);

    let record_bytes = source
        .read_dist_info("RECORD")?
        .expect("validate() guarantees RECORD is present");
    let shipped_record = record::parse_record(&mut record_bytes.as_slice())?;

    // `.dist-info` is classified the same way every other non-`.data` entry is: purelib
    // or platlib per `Root-Is-Purelib`, never treated as its own special scheme.
    let dist_info_scheme = if metadata.root_is_purelib {
        crate::interpreter::Scheme::Purelib
    } else {
        crate::interpreter::Scheme::Platlib
    };
    destination.set_dist_info_scheme(dist_info_scheme);

    let interpreter_basename = interpreter
        .executable
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut entries = Vec::new();

    {
        let _span = debug_span!("copy_entries").entered();
        source.for_each_entry(|entry| {
            // Only the `scripts` scheme needs a content peek (to detect a Python
            // placeholder shebang), and entry-point/data scripts are tiny text files —
            // buffering them costs nothing. Every other scheme (the bulk of a wheel's
            // actual payload: `purelib`/`platlib`/`data`/`headers`) streams straight
            // from the archive into the destination without ever holding the whole
            // member in memory, so a multi-gigabyte wheel installs in bounded memory.
            if entry.scheme == crate::interpreter::Scheme::Scripts {
                let mut buffer = Vec::new();
                entry.reader.read_to_end(&mut buffer).map_err(Error::Io)?;

                if launcher::qualifies_for_rewrite(&buffer, &interpreter_basename) {
                    debug!(path = %entry.archive_path, "rewriting data script shebang");
                    let launcher = build_data_script_launcher(&entry.dest_path, &buffer, interpreter, &interpreter_basename)?;
                    let written = destination.write_script(launcher)?;
                    entries.extend(written);
                    return Ok(());
                }

                let written = destination.write_file(entry.scheme, &entry.dest_path, &mut buffer.as_slice(), entry.executable)?;
                verify_against_shipped_record(&shipped_record, allow_list, &entry.archive_path, &written)?;
                entries.push(written);
                return Ok(());
            }

            let written = destination.write_file(entry.scheme, &entry.dest_path, entry.reader, entry.executable)?;
            verify_against_shipped_record(&shipped_record, allow_list, &entry.archive_path, &written)?;
            entries.push(written);
            Ok(())
        })?;
    }

    {
        let _span = debug_span!("copy_dist_info").entered();
        for member in source.dist_info_members()? {
            let bytes = source
                .read_dist_info(&member)?
                .expect("dist_info_members() only lists files that exist");
            let archive_path = format!("{}/{member}", source.dist_info_dir());

            let written = destination.write_file(dist_info_scheme, &archive_path, &mut bytes.as_slice(), false)?;
            verify_against_shipped_record(&shipped_record, allow_list, &archive_path, &written)?;
            entries.push(written);
        }
    }

    {
        let _span = debug_span!("scripts").entered();
        if let Some(entry_points_bytes) = source.read_dist_info("entry_points.txt")? {
            let text = String::from_utf8(entry_points_bytes)
                .map_err(|err| Error::EntryPoints(err.to_string()))?;
            let (console, gui) = parse_entry_points(&text)?;
            if interpreter.windows_arch.is_none() {
                // POSIX has no console/GUI launcher distinction (both rewrite to the
                // same shebanged script), so a name in both sections would collide.
                if let Some(dup) = gui.iter().find(|g| console.iter().any(|c| c.name == g.name)) {
                    return Err(Error::EntryPoints(format!(
                        "entry point `{}` is declared in both [console_scripts] and [gui_scripts]; \
                         POSIX doesn't distinguish them",
                        dup.name
                    )));
                }
            }
            for script in console.iter().chain(gui.iter()) {
                debug!(name = %script.name, "building launcher");
                let launcher = build_launcher(script, interpreter)?;
                let written = destination.write_script(launcher)?;
                entries.extend(written);
            }
        }
    }

    entries.sort_by(cmp_entries);
    destination.finalize(source.dist_info_dir(), entries, additional_metadata)?;
    Ok(())
}

fn cmp_entries(a: &RecordEntry, b: &RecordEntry) -> std::cmp::Ordering {
    a.path.cmp(&b.path)
}
