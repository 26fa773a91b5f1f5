//! POSIX script generation: shebang rewriting, including the long-shebang trampoline.
//!
//! Linux enforces a ~127-byte limit on `#!` lines and refuses to parse a shebang
//! containing whitespace in its interpreter path as a single argument. `distlib`/`pip`
//! work around both with a `/bin/sh` trampoline: a line that is simultaneously a valid
//! `sh` script (a no-op `'''` string literal Python never evaluates as real code) and a
//! valid POSIX shebang, re-executing the real interpreter with the script as its first
//! argument.

use crate::Error;

/// Longest interpreter shebang the kernel will parse directly.
const MAX_SHEBANG_LENGTH: usize = 127;

/// Build the full text of a POSIX launcher script: shebang (or trampoline) plus body.
/// `flags` is whatever trailing text followed the interpreter on the original
/// shebang line (e.g. `-u`), empty if there was none; it is carried forward after
/// the rewritten interpreter path either way.
pub fn build_script(interpreter: &str, flags: &str, body: &str) -> Result<String, Error> {
    let suffix = if flags.is_empty() { String::new() } else { format!(" {flags}") };
    let shebang = format!("#!{interpreter}{suffix}");
    if shebang.len() <= MAX_SHEBANG_LENGTH && !interpreter.contains(char::is_whitespace) {
        return Ok(format!("{shebang}\n{body}"));
    }
    Ok(trampoline(interpreter, &suffix, body))
}

/// The `'''exec' interpreter "$0" "$@"\n'''` trampoline, valid as both `sh` and Python.
fn trampoline(interpreter: &str, flag_suffix: &str, body: &str) -> String {
    format!(
        "#!/bin/sh\n'''exec' \"{interpreter}\"{flag_suffix} \"$0\" \"$@\"\n' '''\n{body}"
    )
}
