//! Windows launcher EXE construction, compatible with `distlib`'s `simple_launcher`.
//!
//! A launcher EXE is three things concatenated: a precompiled native stub that knows
//! how to find and re-exec an interpreter, a CRLF-terminated `#!`-style shebang line
//! naming that interpreter, and a `zip` archive (appended raw, since ZIP central
//! directories are located from the *end* of the file) containing a `__main__.py` that
//! does the actual import-and-call.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::entry_points::Script;
use crate::interpreter::WindowsArch;
use crate::Error;

const T32: &[u8] = include_bytes!("stubs/t32.exe");
const T64: &[u8] = include_bytes!("stubs/t64.exe");
const T64_ARM: &[u8] = include_bytes!("stubs/t64-arm.exe");
const W32: &[u8] = include_bytes!("stubs/w32.exe");
const W64: &[u8] = include_bytes!("stubs/w64.exe");
const W64_ARM: &[u8] = include_bytes!("stubs/w64-arm.exe");

fn stub_for(arch: WindowsArch, script: &Script) -> &'static [u8] {
    use crate::entry_points::ScriptSection::{Console, Gui};
    match (arch, script.section) {
        (WindowsArch::X86, Console) => T32,
        (WindowsArch::X86, Gui) => W32,
        (WindowsArch::X64, Console) => T64,
        (WindowsArch::X64, Gui) => W64,
        (WindowsArch::Arm64, Console) => T64_ARM,
        (WindowsArch::Arm64, Gui) => W64_ARM,
    }
}

/// Concatenate `stub`, a CRLF shebang naming `interpreter`, and a ZIP archive
/// containing `__main__.py` = `main_py`. ZIP central directories are located by
/// scanning backward from the end of the file, so appending one after arbitrary
/// leading bytes produces a ZIP that both `zip`/`unzip` and Python's `zipimport` can
/// still open.
fn build_exe(stub: &'static [u8], interpreter: &str, flags: &str, main_py: &str) -> Result<Vec<u8>, Error> {
    let mut zip_buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut zip_buffer);
        let options: FileOptions =
            FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer
            .start_file("__main__.py", options)
            .map_err(Error::Zip)?;
        writer
            .write_all(main_py.as_bytes())
            .map_err(Error::Io)?;
        writer.finish().map_err(Error::Zip)?;
    }

    let suffix = if flags.is_empty() { String::new() } else { format!(" {flags}") };
    let mut exe = Vec::with_capacity(stub.len() + interpreter.len() + zip_buffer.get_ref().len() + 8);
    exe.extend_from_slice(stub);
    exe.extend_from_slice(format!("#!{interpreter}{suffix}\r\n").as_bytes());
    exe.extend_from_slice(zip_buffer.get_ref());
    Ok(exe)
}

/// Build the `.exe` bytes for `script`, targeting `arch`, re-execing `interpreter`.
pub fn build_launcher(script: &Script, interpreter: &str, flags: &str, arch: WindowsArch) -> Result<Vec<u8>, Error> {
    let stub = stub_for(arch, script);
    let main_py = super::script_body(script);
    build_exe(stub, interpreter, flags, &main_py)
}

/// Build the `.exe` bytes for a raw `.data/scripts/` member whose body (already
/// stripped of its placeholder shebang) is run as `__main__.py` verbatim.
///
/// There's no `console`/`gui` distinction in a wheel's `.data/scripts/` tree — that's
/// only recorded for `entry_points.txt`-declared scripts — so this always picks the
/// console stub, matching `distlib`'s behavior for data scripts on Windows.
pub fn build_launcher_raw(main_py: &str, interpreter: &str, flags: &str, arch: WindowsArch) -> Result<Vec<u8>, Error> {
    let stub = match arch {
        WindowsArch::X86 => T32,
        WindowsArch::X64 => T64,
        WindowsArch::Arm64 => T64_ARM,
    };
    build_exe(stub, interpreter, flags, main_py)
}
