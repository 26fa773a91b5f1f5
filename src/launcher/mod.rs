//! Turns an entry point [`Script`](crate::entry_points::Script) into a runnable,
//! installable artifact: a shebang-rewritten text script on POSIX, a launcher `.exe`
//! plus the text script it wraps on Windows.
//!
//! The same rewrite also applies to scripts a wheel ships directly under
//! `.data/<name>/scripts/` (rather than declaring through `entry_points.txt`): see
//! [`qualifies_for_rewrite`] and [`rewrite_data_script`].

mod posix;
mod windows;

use crate::entry_points::{Script, ScriptSection};
use crate::interpreter::WindowsArch;
use crate::Error;

/// The file(s) a single entry point produces at its destination.
pub enum Launcher {
    /// POSIX: one executable text file, written at `{scripts}/{name}`.
    Posix { name: String, content: String },
    /// Windows: an `.exe` at `{scripts}/{name}.exe` plus the `.py` it launches,
    /// written alongside it so the launcher can locate it next to itself.
    Windows {
        name: String,
        exe: Vec<u8>,
        script_py: String,
    },
}

/// The Python source body every launcher ultimately runs: `import <module>` followed
/// by a call to `<module>.<attr>()`, wrapped in `sys.exit(...)` for console scripts
/// only — a GUI script has no terminal to report an exit code to, so it calls the
/// attribute directly.
fn script_body(script: &Script) -> String {
    let module = &script.module;
    let attribute = &script.attribute;
    match script.section {
        ScriptSection::Console => format!("import {module}\nimport sys\nsys.exit({module}.{attribute}())\n"),
        ScriptSection::Gui => format!("import {module}\n{module}.{attribute}()\n"),
    }
}

/// Build the POSIX launcher for `script`, shebanged at `interpreter`.
pub fn build_posix(script: &Script, interpreter: &str) -> Result<Launcher, Error> {
    let content = posix::build_script(interpreter, "", &script_body(script))?;
    Ok(Launcher::Posix {
        name: script.name.clone(),
        content,
    })
}

/// Build the Windows launcher for `script`, targeting `arch` and shebanged at `interpreter`.
pub fn build_windows(script: &Script, interpreter: &str, arch: WindowsArch) -> Result<Launcher, Error> {
    let exe = windows::build_launcher(script, interpreter, "", arch)?;
    Ok(Launcher::Windows {
        name: script.name.clone(),
        exe,
        script_py: script_body(script),
    })
}

/// Whether an archive member under the `scripts` scheme qualifies for launcher
/// rewrite: its first line must be a `#!` shebang naming, among its whitespace-
/// separated tokens, `python`, `pythonw`, or `interpreter_basename` itself, matched
/// case-insensitively (real shebangs are lowercase, and Windows filenames aren't
/// case-sensitive to begin with, so this crate doesn't special-case by host OS).
pub fn qualifies_for_rewrite(bytes: &[u8], interpreter_basename: &str) -> bool {
    shebang_flags(bytes, interpreter_basename).is_some()
}

/// If `bytes` starts with a qualifying Python shebang (see [`qualifies_for_rewrite`]),
/// return whatever text followed the matched interpreter token on that line — e.g.
/// `-u` for `#!/usr/bin/env python3 -u` — so the rewritten shebang can carry it
/// forward after the new interpreter path, the same way `distlib`'s launcher does.
/// An empty string (not `None`) means the shebang qualified but carried no flags.
fn shebang_flags(bytes: &[u8], interpreter_basename: &str) -> Option<String> {
    let first_line = bytes.split(|&b| b == b'\n').next()?;
    let first_line = std::str::from_utf8(first_line).ok()?.trim_end_matches('\r');
    let rest = first_line.strip_prefix("#!")?;

    let interpreter_basename = interpreter_basename.to_ascii_lowercase();
    let mut search_from = 0usize;
    for token in rest.split_whitespace() {
        let start = search_from + rest[search_from..].find(token)?;
        let end = start + token.len();
        let basename = token.rsplit(['/', '\\']).next().unwrap_or(token).to_ascii_lowercase();
        if basename == "python" || basename == "pythonw" || basename == interpreter_basename {
            return Some(rest[end..].trim_start().to_string());
        }
        search_from = end;
    }
    None
}

/// Strip a script's existing shebang line, if it has one, returning the remainder.
fn strip_shebang(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.split_once('\n') {
        Some((first, rest)) if first.trim_end_matches('\r').starts_with("#!") => rest.to_string(),
        _ => text.into_owned(),
    }
}

/// Rewrite a raw `.data/<...>/scripts/` archive member that [`qualifies_for_rewrite`],
/// replacing its placeholder shebang with `interpreter`, preserving any trailing
/// interpreter flags the original shebang carried (e.g. `#!/usr/bin/env python3 -u`
/// keeps `-u` after the rewritten interpreter path). Unlike [`build_posix`]/
/// [`build_windows`], the launcher body is the file's own content (minus its old
/// shebang), not a generated `import`-and-call — these are scripts the wheel already
/// shipped, not synthesized entry points.
pub fn rewrite_data_script(
    name: &str,
    bytes: &[u8],
    interpreter: &str,
    interpreter_basename: &str,
    arch: Option<WindowsArch>,
) -> Result<Launcher, Error> {
    let flags = shebang_flags(bytes, interpreter_basename).unwrap_or_default();
    let body = strip_shebang(bytes);
    match arch {
        None => {
            let content = posix::build_script(interpreter, &flags, &body)?;
            Ok(Launcher::Posix {
                name: name.to_string(),
                content,
            })
        }
        Some(arch) => {
            let exe = windows::build_launcher_raw(&body, interpreter, &flags, arch)?;
            Ok(Launcher::Windows {
                name: name.to_string(),
                exe,
                script_py: body,
            })
        }
    }
}
