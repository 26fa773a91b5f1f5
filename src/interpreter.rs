//! The target interpreter and installation scheme map an install runs against.
//!
//! Everything this crate needs to know about *where* things go and *which* Python
//! runs scripts — resolving that contract (reading `sysconfig`, probing a venv) is
//! explicitly the caller's job; this crate only consumes the result.

use std::collections::HashMap;
use std::path::PathBuf;

/// CPU architecture a Windows launcher stub must be built for.
///
/// Matches the three architectures `distlib`/`pip` ship precompiled launcher stubs
/// for; there is no generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowsArch {
    X86,
    X64,
    Arm64,
}

/// The installation scheme keys a wheel's `.data/` subdirectories and purelib/platlib
/// roots can map to.
///
/// <https://docs.python.org/3/library/sysconfig.html#installation-paths>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scheme {
    Purelib,
    Platlib,
    Headers,
    Scripts,
    Data,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purelib => "purelib",
            Self::Platlib => "platlib",
            Self::Headers => "headers",
            Self::Scripts => "scripts",
            Self::Data => "data",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "purelib" => Some(Self::Purelib),
            "platlib" => Some(Self::Platlib),
            "headers" => Some(Self::Headers),
            "scripts" => Some(Self::Scripts),
            "data" => Some(Self::Data),
            _ => None,
        }
    }
}

/// The target Python interpreter an install is being performed for.
#[derive(Debug, Clone)]
pub struct Interpreter {
    /// Absolute path written into generated script shebangs.
    pub executable: PathBuf,
    /// `None` on non-Windows targets, where no launcher EXE is built.
    pub windows_arch: Option<WindowsArch>,
    /// Where each scheme's files land on disk.
    pub scheme: HashMap<Scheme, PathBuf>,
}

impl Interpreter {
    pub fn path_for(&self, scheme: Scheme) -> Option<&PathBuf> {
        self.scheme.get(&scheme)
    }
}
