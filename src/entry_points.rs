//! `entry_points.txt`: console/GUI scripts to materialize as launchers.
//!
//! <https://packaging.python.org/en/latest/specifications/entry-points/>
//!
//! ```ini
//! [console_scripts]
//! pip = pip._internal.cli.main:main
//!
//! [gui_scripts]
//! pipw = pip._internal.cli.main:main
//! ```

use rustc_hash::FxHashSet;

use crate::Error;

/// Which launcher kind a script should be built as.
///
/// The rewrite mechanism is shared on both platforms (shebang rewrite on POSIX, stub
/// selection on Windows), but the generated body differs: console scripts wrap the call
/// in `sys.exit(...)` so the process's exit code reflects the return value, GUI scripts
/// call the attribute directly since there's no terminal to report it to. On Windows the
/// section also picks the stub binary — a windowed (`w`-prefixed) one for GUI scripts so
/// they don't pop up a console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSection {
    Console,
    Gui,
}

/// One `name = module:attribute` entry point, ready to become a launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub module: String,
    pub attribute: String,
    pub section: ScriptSection,
}

fn parse_target(name: &str, target: &str) -> Result<(String, String), Error> {
    let (module, attribute) = target.split_once(':').ok_or_else(|| Error::InvalidScript {
        name: name.to_string(),
        reason: format!("no `module:attribute` target: `{target}`"),
    })?;
    Ok((module.trim().to_string(), attribute.trim().to_string()))
}

fn read_section(
    ini: &std::collections::HashMap<String, std::collections::HashMap<String, Option<String>>>,
    section: &str,
    kind: ScriptSection,
) -> Result<Vec<Script>, Error> {
    let Some(entries) = ini.get(section) else {
        return Ok(Vec::new());
    };
    let mut seen = FxHashSet::default();
    let mut scripts = Vec::new();
    for (name, value) in entries {
        let target = value.as_deref().unwrap_or("").trim();
        if target.is_empty() {
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(Error::EntryPoints(format!(
                "duplicate entry point `{name}` in [{section}]"
            )));
        }
        let (module, attribute) = parse_target(name, target)?;
        scripts.push(Script {
            name: name.clone(),
            module,
            attribute,
            section: kind,
        });
    }
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

/// Parse `entry_points.txt` content into `(console_scripts, gui_scripts)`.
pub fn parse_entry_points(content: &str) -> Result<(Vec<Script>, Vec<Script>), Error> {
    let mut parser = configparser::ini::Ini::new_cs();
    let ini = parser
        .read(content.to_string())
        .map_err(Error::EntryPoints)?;

    let console = read_section(&ini, "console_scripts", ScriptSection::Console)?;
    let gui = read_section(&ini, "gui_scripts", ScriptSection::Gui)?;
    Ok((console, gui))
}
