//! Distribution name and version as derived purely from a `.whl` filename.
//!
//! <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#file-name-convention>
//!
//! `{distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl`
//!
//! This never looks inside the archive: `METADATA` parsing is out of scope, and the
//! filename is normative for install planning regardless of what `METADATA` claims.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Error;

/// `name` and `version`, parsed out of a wheel filename, plus the optional build tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    pub distribution: String,
    pub version: String,
    pub build_tag: Option<String>,
    pub tags: Vec<String>,
}

static COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.+!-]+$").unwrap());
static NORMALIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_.]+").unwrap());

/// Normalize a distribution name per PEP 503: lowercase, runs of `-_.` collapsed to `-`.
pub fn normalize_name(name: &str) -> String {
    NORMALIZE.replace_all(&name.to_lowercase(), "-").into_owned()
}

impl WheelFilename {
    /// Parse `{name}-{version}(-{build})?-{pytag}-{abitag}-{platform}.whl`.
    pub fn parse(filename: &str) -> Result<Self, Error> {
        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| Error::WheelFilename(filename.to_string()))?;

        let parts: Vec<&str> = stem.split('-').collect();
        if parts.len() != 5 && parts.len() != 6 {
            return Err(Error::WheelFilename(filename.to_string()));
        }
        for part in &parts {
            if !COMPONENT.is_match(part) {
                return Err(Error::WheelFilename(filename.to_string()));
            }
        }

        let (distribution, version, build_tag, tag_parts) = if parts.len() == 6 {
            (parts[0], parts[1], Some(parts[2].to_string()), &parts[3..6])
        } else {
            (parts[0], parts[1], None, &parts[2..5])
        };

        Ok(Self {
            distribution: normalize_name(distribution),
            version: version.to_string(),
            build_tag,
            tags: tag_parts.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// The `{distribution}-{version}.dist-info` directory name this wheel must contain.
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.distribution, self.version)
    }
}
