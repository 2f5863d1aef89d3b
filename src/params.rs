//! Device configuration parameters
//!
//! Parameters live in an INI-style file. The `[Common]` section applies to
//! every device; a section named after a device serial overrides individual
//! keys for that device. Each value has the form `<value>|<xmltype>`:
//!
//! ```text
//! [Common]
//! Device.Services.FAPService.1.CellConfig.LTE.RAN.RF.EARFCNDL = 6300|xsd:unsignedInt
//!
//! [SN0001]
//! Device.Services.FAPService.1.CellConfig.LTE.RAN.RF.PhyCellID = 42|xsd:unsignedInt
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::{Error, Result};

/// Section applied to every device
pub const COMMON_SECTION: &str = "Common";

/// A single parameter to push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry {
    pub value: String,
    pub xmltype: String,
}

/// Parameters resolved for one device, common entries first
pub type ResolvedParams = IndexMap<String, ParamEntry>;

/// Parsed parameter file: section name -> raw `key = value` rows
#[derive(Debug, Clone, Default)]
pub struct ParameterSource {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ParameterSource {
    /// Parse INI text
    ///
    /// Keys keep their case. `#` and `;` start comment lines. Rows may use
    /// `=` or `:` as separator. A repeated key within a section replaces the
    /// earlier row.
    ///
    /// # Errors
    ///
    /// Returns error on a row outside any section or a line that is neither
    /// a section header nor a `key = value` row
    pub fn parse(text: &str) -> Result<Self> {
        let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((key, value)) = split_row(line) else {
                return Err(Error::Params(format!("line {}: expected `key = value`", idx + 1)));
            };
            let Some(section) = current.as_ref() else {
                return Err(Error::Params(format!(
                    "line {}: row before first section header",
                    idx + 1
                )));
            };

            sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }

        Ok(Self { sections })
    }

    /// Read and parse a parameter file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Whether a section with exactly this name exists
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Resolve the parameter set for a device
    ///
    /// `[Common]` is applied first, then the section named exactly `serial`
    /// overrides keys of the same name. Rows whose value does not split into
    /// `<value>|<xmltype>` are skipped with a warning.
    #[must_use]
    pub fn resolve(&self, serial: Option<&str>) -> ResolvedParams {
        let mut params = ResolvedParams::new();

        if self.has_section(COMMON_SECTION) {
            self.merge_section(COMMON_SECTION, &mut params);
        } else {
            tracing::warn!("parameter source has no [{COMMON_SECTION}] section");
        }

        if let Some(serial) = serial.filter(|s| self.has_section(s)) {
            self.merge_section(serial, &mut params);
        }

        params
    }

    fn merge_section(&self, name: &str, params: &mut ResolvedParams) {
        let Some(rows) = self.sections.get(name) else {
            return;
        };

        for (key, raw) in rows {
            match split_typed_value(raw) {
                Some(entry) => {
                    params.insert(key.clone(), entry);
                }
                None => {
                    tracing::warn!(
                        section = %name,
                        key = %key,
                        value = %raw,
                        "failed to parse parameter row, skipping"
                    );
                }
            }
        }
    }
}

/// Split a row at the first `=` or `:`, whichever comes first
fn split_row(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[pos + 1..].trim()))
}

/// Split `<value>|<xmltype>`; anything but exactly one `|` is rejected
fn split_typed_value(raw: &str) -> Option<ParamEntry> {
    let mut parts = raw.split('|');
    let value = parts.next()?;
    let xmltype = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ParamEntry {
        value: value.to_string(),
        xmltype: xmltype.to_string(),
    })
}

/// Something that can produce the parameter set for a device
pub trait ParameterProvider: Send + Sync {
    /// Resolve parameters for `serial`
    ///
    /// # Errors
    ///
    /// Returns error if the underlying source cannot be loaded
    fn resolve(&self, serial: Option<&str>) -> Result<ResolvedParams>;
}

impl ParameterProvider for ParameterSource {
    fn resolve(&self, serial: Option<&str>) -> Result<ResolvedParams> {
        Ok(Self::resolve(self, serial))
    }
}

/// Parameter file re-read on every resolution, so edits apply without restart
#[derive(Debug, Clone)]
pub struct ParameterFile {
    path: PathBuf,
}

impl ParameterFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParameterProvider for ParameterFile {
    fn resolve(&self, serial: Option<&str>) -> Result<ResolvedParams> {
        let source = ParameterSource::load(&self.path).map_err(|e| {
            Error::Params(format!("{}: {e}", self.path.display()))
        })?;
        Ok(source.resolve(serial))
    }
}
