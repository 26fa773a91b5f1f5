//! The `{dist-info}/WHEEL` file: format version and purelib/platlib routing.
//!
//! <https://packaging.python.org/en/latest/specifications/binary-distribution-format/#the-dist-info-directory>
//!
//! `WHEEL` is an RFC 822 header block, same shape as `METADATA`, which is why this
//! reuses `mailparse` rather than hand-rolling a second key/value line splitter.

use crate::Error;

/// The only wheel format major version this crate understands how to install.
const SUPPORTED_MAJOR_VERSION: &str = "1";

/// Parsed `WHEEL` contents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WheelMetadata {
    pub wheel_version: String,
    pub root_is_purelib: bool,
    pub generator: Option<String>,
}

impl WheelMetadata {
    /// Parse the raw bytes of a `WHEEL` file.
    ///
    /// Rejects a `Wheel-Version` whose major component isn't `1`, per PEP 427: a newer
    /// major version may have made on-disk-layout-affecting changes this crate does not
    /// know how to apply.
    pub fn parse(content: &[u8]) -> Result<Self, Error> {
        let headers = mailparse::parse_headers(content)
            .map_err(|err| Error::WheelMetadata(err.to_string()))?
            .0;

        let wheel_version = headers
            .iter()
            .find(|h| h.get_key_ref().eq_ignore_ascii_case("Wheel-Version"))
            .map(|h| h.get_value())
            .ok_or_else(|| Error::WheelMetadata("missing Wheel-Version".to_string()))?;

        let major = wheel_version
            .split('.')
            .next()
            .ok_or_else(|| Error::WheelMetadata(format!("malformed Wheel-Version `{wheel_version}`")))?;
        if major != SUPPORTED_MAJOR_VERSION {
            return Err(Error::UnsupportedWheelVersion { found: wheel_version });
        }

        let root_is_purelib = headers
            .iter()
            .find(|h| h.get_key_ref().eq_ignore_ascii_case("Root-Is-Purelib"))
            .map(|h| h.get_value().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let generator = headers
            .iter()
            .find(|h| h.get_key_ref().eq_ignore_ascii_case("Generator"))
            .map(|h| h.get_value());

        Ok(Self {
            wheel_version,
            root_is_purelib,
            generator,
        })
    }
}
