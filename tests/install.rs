//! End-to-end install: builds a synthetic wheel in memory (no real `.whl` fixture is
//! available), then drives the engine against a real temp directory tree.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use zip::write::FileOptions;
use zip::ZipWriter;

use wheel_installer::destination::scheme_dict::SchemeDestination;
use wheel_installer::engine::install;
use wheel_installer::filename::WheelFilename;
use wheel_installer::hash::{digest, AllowList, HashAlgorithm};
use wheel_installer::interpreter::{Interpreter, Scheme};
use wheel_installer::source::zip::ZipWheelSource;

const WHEEL_FILE: &[u8] =
    b"Wheel-Version: 1.0\nGenerator: test-harness\nRoot-Is-Purelib: true\nTag: py3-none-any\n";
const METADATA_FILE: &[u8] = b"Metadata-Version: 2.1\nName: demo\nVersion: 1.0\n";

fn record_row(path: &str, content: &[u8]) -> String {
    format!(
        "{path},sha256={},{}\n",
        digest(HashAlgorithm::Sha256, content),
        content.len()
    )
}

/// Build a minimal but valid `demo-1.0-py3-none-any.whl` in memory.
///
/// `record_override` lets a test ship a `RECORD` row that doesn't match `init_py`'s
/// real content, to exercise the mismatch-detection path without corrupting the ZIP
/// container itself (which would just fail CRC validation instead).
fn build_wheel(init_py: &[u8], entry_points: Option<&str>, record_override: Option<String>) -> Vec<u8> {
    let mut record = String::new();
    record.push_str(&record_override.unwrap_or_else(|| record_row("demo/__init__.py", init_py)));
    record.push_str(&record_row("demo-1.0.dist-info/WHEEL", WHEEL_FILE));
    record.push_str(&record_row("demo-1.0.dist-info/METADATA", METADATA_FILE));
    if let Some(ep) = entry_points {
        record.push_str(&record_row("demo-1.0.dist-info/entry_points.txt", ep.as_bytes()));
    }
    record.push_str("demo-1.0.dist-info/RECORD,,\n");

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

        writer.start_file("demo/__init__.py", options).unwrap();
        writer.write_all(init_py).unwrap();

        writer.start_file("demo-1.0.dist-info/WHEEL", options).unwrap();
        writer.write_all(WHEEL_FILE).unwrap();

        writer.start_file("demo-1.0.dist-info/METADATA", options).unwrap();
        writer.write_all(METADATA_FILE).unwrap();

        if let Some(ep) = entry_points {
            writer.start_file("demo-1.0.dist-info/entry_points.txt", options).unwrap();
            writer.write_all(ep.as_bytes()).unwrap();
        }

        writer.start_file("demo-1.0.dist-info/RECORD", options).unwrap();
        writer.write_all(record.as_bytes()).unwrap();

        writer.finish().unwrap();
    }
    buffer.into_inner()
}

fn scheme_roots(site_packages: &std::path::Path, scripts: &std::path::Path) -> HashMap<Scheme, PathBuf> {
    let mut roots = HashMap::new();
    roots.insert(Scheme::Purelib, site_packages.to_path_buf());
    roots.insert(Scheme::Platlib, site_packages.to_path_buf());
    roots.insert(Scheme::Scripts, scripts.to_path_buf());
    roots.insert(Scheme::Headers, site_packages.join("include"));
    roots.insert(Scheme::Data, site_packages.parent().unwrap().to_path_buf());
    roots
}

struct Layout {
    _temp: tempfile::TempDir,
    site_packages: PathBuf,
    scripts: PathBuf,
}

fn layout() -> Layout {
    let temp = tempfile::tempdir().unwrap();
    let site_packages = temp.path().join("lib/site-packages");
    let scripts = temp.path().join("bin");
    Layout {
        _temp: temp,
        site_packages,
        scripts,
    }
}

fn interpreter() -> Interpreter {
    Interpreter {
        executable: PathBuf::from("/usr/bin/python3"),
        windows_arch: None,
        scheme: HashMap::new(),
    }
}

#[test]
fn installs_module_and_dist_info() {
    let init_py = b"__version__ = \"1.0\"\n".as_slice();
    let wheel_bytes = build_wheel(init_py, None, None);

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(wheel_bytes), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new()).unwrap();

    let installed_init = std::fs::read(layout.site_packages.join("demo/__init__.py")).unwrap();
    assert_eq!(installed_init, init_py);

    let installed_metadata =
        std::fs::read(layout.site_packages.join("demo-1.0.dist-info/METADATA")).unwrap();
    assert_eq!(installed_metadata, METADATA_FILE);

    let record_text =
        std::fs::read_to_string(layout.site_packages.join("demo-1.0.dist-info/RECORD")).unwrap();
    assert!(record_text.contains("demo/__init__.py,sha256="));
    assert!(record_text.contains("demo-1.0.dist-info/RECORD,,"));
    assert!(record_text.contains("demo-1.0.dist-info/WHEEL,sha256="));
}

#[test]
fn installs_console_script_launcher() {
    let init_py = b"def main():\n    print('hi')\n".as_slice();
    let entry_points = "[console_scripts]\ndemo = demo:main\n";
    let wheel_bytes = build_wheel(init_py, Some(entry_points), None);

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(wheel_bytes), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new()).unwrap();

    let script_path = layout.scripts.join("demo");
    let content = std::fs::read_to_string(&script_path).unwrap();
    assert!(content.starts_with("#!/usr/bin/python3\n"));
    assert!(content.contains("import demo"));
    assert!(content.contains("sys.exit(demo.main())"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&script_path).unwrap().permissions().mode();
        assert!(mode & 0o111 != 0, "script should be executable");
    }
}

#[test]
fn rejects_member_with_record_mismatch() {
    let init_py = b"__version__ = \"1.0\"\n".as_slice();
    // A RECORD row claiming the wrong size for demo/__init__.py — the content on disk
    // never matches what the wheel's own manifest promised.
    let bogus_row = format!(
        "demo/__init__.py,sha256={},999999\n",
        digest(HashAlgorithm::Sha256, init_py)
    );
    let wheel_bytes = build_wheel(init_py, None, Some(bogus_row));

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(wheel_bytes), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    let err = install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, wheel_installer::Error::RecordMismatch { .. }));
}

#[test]
fn data_scripts_route_to_scripts_scheme_unrewritten_when_not_python() {
    let init_py = b"x = 1\n".as_slice();
    let tool_sh = b"#!/bin/sh\necho hi\n".as_slice();

    let mut record = String::new();
    record.push_str(&record_row("demo/__init__.py", init_py));
    record.push_str(&record_row("demo-1.0.data/scripts/tool.sh", tool_sh));
    record.push_str(&record_row("demo-1.0.dist-info/WHEEL", WHEEL_FILE));
    record.push_str("demo-1.0.dist-info/RECORD,,\n");

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("demo/__init__.py", options).unwrap();
        writer.write_all(init_py).unwrap();
        writer.start_file("demo-1.0.data/scripts/tool.sh", options).unwrap();
        writer.write_all(tool_sh).unwrap();
        writer.start_file("demo-1.0.dist-info/WHEEL", options).unwrap();
        writer.write_all(WHEEL_FILE).unwrap();
        writer.start_file("demo-1.0.dist-info/RECORD", options).unwrap();
        writer.write_all(record.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(buffer.into_inner()), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new()).unwrap();

    let installed = std::fs::read(layout.scripts.join("tool.sh")).unwrap();
    assert_eq!(installed, tool_sh);
}

#[test]
fn data_scripts_with_python_shebang_are_rewritten() {
    let init_py = b"x = 1\n".as_slice();
    let tool_py = b"#!python\nprint('hi')\n".as_slice();

    let mut record = String::new();
    record.push_str(&record_row("demo/__init__.py", init_py));
    record.push_str(&record_row("demo-1.0.data/scripts/tool.py", tool_py));
    record.push_str(&record_row("demo-1.0.dist-info/WHEEL", WHEEL_FILE));
    record.push_str("demo-1.0.dist-info/RECORD,,\n");

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("demo/__init__.py", options).unwrap();
        writer.write_all(init_py).unwrap();
        writer.start_file("demo-1.0.data/scripts/tool.py", options).unwrap();
        writer.write_all(tool_py).unwrap();
        writer.start_file("demo-1.0.dist-info/WHEEL", options).unwrap();
        writer.write_all(WHEEL_FILE).unwrap();
        writer.start_file("demo-1.0.dist-info/RECORD", options).unwrap();
        writer.write_all(record.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(buffer.into_inner()), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new()).unwrap();

    let content = std::fs::read_to_string(layout.scripts.join("tool.py")).unwrap();
    assert!(content.starts_with("#!/usr/bin/python3\n"));
    assert!(content.contains("print('hi')"));
}

#[test]
fn root_is_platlib_routes_dist_info_and_record_there() {
    let init_py = b"x = 1\n".as_slice();
    let wheel_file = b"Wheel-Version: 1.0\nRoot-Is-Purelib: false\n".as_slice();

    let mut record = String::new();
    record.push_str(&record_row("demo/__init__.py", init_py));
    record.push_str(&record_row("demo-1.0.dist-info/WHEEL", wheel_file));
    record.push_str("demo-1.0.dist-info/RECORD,,\n");

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("demo/__init__.py", options).unwrap();
        writer.write_all(init_py).unwrap();
        writer.start_file("demo-1.0.dist-info/WHEEL", options).unwrap();
        writer.write_all(wheel_file).unwrap();
        writer.start_file("demo-1.0.dist-info/RECORD", options).unwrap();
        writer.write_all(record.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let temp = tempfile::tempdir().unwrap();
    let purelib = temp.path().join("purelib");
    let platlib = temp.path().join("platlib");
    let scripts = temp.path().join("bin");
    let mut roots = HashMap::new();
    roots.insert(Scheme::Purelib, purelib.clone());
    roots.insert(Scheme::Platlib, platlib.clone());
    roots.insert(Scheme::Scripts, scripts);

    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(buffer.into_inner()), &filename).unwrap();
    let mut destination = SchemeDestination::new(roots);

    install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new()).unwrap();

    assert!(platlib.join("demo/__init__.py").exists());
    assert!(platlib.join("demo-1.0.dist-info/WHEEL").exists());
    assert!(platlib.join("demo-1.0.dist-info/RECORD").exists());
    assert!(!purelib.exists());

    let record_text = std::fs::read_to_string(platlib.join("demo-1.0.dist-info/RECORD")).unwrap();
    assert!(record_text.contains("demo/__init__.py,sha256="));
}

#[test]
fn rejects_unsupported_wheel_version() {
    let init_py = b"x = 1\n".as_slice();
    let wheel_file = b"Wheel-Version: 2.0\nRoot-Is-Purelib: true\n".as_slice();

    let mut record = String::new();
    record.push_str(&record_row("demo/__init__.py", init_py));
    record.push_str(&record_row("demo-1.0.dist-info/WHEEL", wheel_file));
    record.push_str("demo-1.0.dist-info/RECORD,,\n");

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("demo/__init__.py", options).unwrap();
        writer.write_all(init_py).unwrap();
        writer.start_file("demo-1.0.dist-info/WHEEL", options).unwrap();
        writer.write_all(wheel_file).unwrap();
        writer.start_file("demo-1.0.dist-info/RECORD", options).unwrap();
        writer.write_all(record.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(buffer.into_inner()), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    let err = install(&mut source, &mut destination, &interpreter(), &filename, &AllowList::default(), &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, wheel_installer::Error::UnsupportedWheelVersion { .. }));

    // Nothing should have been written: the version check aborts before any copy.
    assert!(!layout.site_packages.join("demo/__init__.py").exists());
}

#[test]
fn additional_metadata_is_written_and_recorded() {
    let init_py = b"x = 1\n".as_slice();
    let wheel_bytes = build_wheel(init_py, None, None);

    let layout = layout();
    let filename = WheelFilename::parse("demo-1.0-py3-none-any.whl").unwrap();
    let mut source = ZipWheelSource::new(Cursor::new(wheel_bytes), &filename).unwrap();
    let mut destination = SchemeDestination::new(scheme_roots(&layout.site_packages, &layout.scripts));

    let mut extra = HashMap::new();
    extra.insert("INSTALLER".to_string(), b"my-installer\n".to_vec());

    install(
        &mut source,
        &mut destination,
        &interpreter(),
        &filename,
        &AllowList::default(),
        &extra,
    )
    .unwrap();

    let installer = std::fs::read(layout.site_packages.join("demo-1.0.dist-info/INSTALLER")).unwrap();
    assert_eq!(installer, b"my-installer\n");

    let record_text =
        std::fs::read_to_string(layout.site_packages.join("demo-1.0.dist-info/RECORD")).unwrap();
    assert!(record_text.contains("demo-1.0.dist-info/INSTALLER,sha256="));
}
