// crates/communes-core/src/config.rs

//! Source-reading configuration: CSV delimiter, text encoding, and the header
//! spellings accepted for each logical column.
//!
//! Values come from three layers: built-in defaults, an optional TOML file,
//! then command-line flags (applied by the caller).
//!
//! ```toml
//! [csv]
//! delimiter = ";"
//! encoding = "windows-1252"
//!
//! [csv.aliases]
//! name = ["Libelle_commune"]
//! ```

use crate::error::{CommuneError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Text encoding of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceEncoding {
    Utf8,
    Windows1252,
    /// UTF-8 when the bytes decode cleanly, Windows-1252 otherwise.
    #[default]
    Auto,
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "windows-1252" | "windows1252" | "cp1252" | "latin1" | "latin-1" => {
                Ok(Self::Windows1252)
            }
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown encoding {other:?} (expected utf8, windows-1252 or auto)"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for SourceEncoding {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Accepted header spellings per logical column. The first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    pub name: Vec<String>,
    pub postal_code: Vec<String>,
    pub insee: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            name: owned(&["Nom_de_la_commune", "Nom_commune", "nom_commune", "Libelle_commune"]),
            postal_code: owned(&["Code_postal", "code_postal"]),
            insee: owned(&["#Code_commune_INSEE", "Code_commune_INSEE", "code_commune_insee"]),
        }
    }
}

impl ColumnAliases {
    /// Adds extra spellings ahead of the built-in ones.
    pub fn extend_front(&mut self, extra: &AliasLayer) {
        fn merge(dst: &mut Vec<String>, src: &[String]) {
            let mut merged: Vec<String> = src.to_vec();
            merged.extend(dst.drain(..).filter(|s| !src.contains(s)));
            *dst = merged;
        }
        merge(&mut self.name, &extra.name);
        merge(&mut self.postal_code, &extra.postal_code);
        merge(&mut self.insee, &extra.insee);
    }
}

/// CSV reading options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub encoding: SourceEncoding,
    pub aliases: ColumnAliases,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            encoding: SourceEncoding::Auto,
            aliases: ColumnAliases::default(),
        }
    }
}

// -----------------------------------------------------------------------------
// TOML LAYER
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasLayer {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub postal_code: Vec<String>,
    #[serde(default)]
    pub insee: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvLayer {
    pub delimiter: Option<String>,
    pub encoding: Option<SourceEncoding>,
    #[serde(default)]
    pub aliases: AliasLayer,
}

/// Contents of a `--config` file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub csv: CsvLayer,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CommuneError::Config {
            path: path.to_path_buf(),
            message: format!("failed to read: {e}"),
        })?;
        toml::from_str(&contents).map_err(|e| CommuneError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Applies this layer on top of `base`.
    pub fn apply(&self, base: &mut CsvOptions, path: &Path) -> Result<()> {
        if let Some(d) = &self.csv.delimiter {
            base.delimiter = parse_delimiter(d).map_err(|message| CommuneError::Config {
                path: path.to_path_buf(),
                message,
            })?;
        }
        if let Some(enc) = self.csv.encoding {
            base.encoding = enc;
        }
        base.aliases.extend_front(&self.csv.aliases);
        Ok(())
    }
}

/// Parses a one-byte delimiter. `tab` and `\t` are accepted for tabs.
pub fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!("delimiter must be a single ASCII character, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encodings() {
        assert_eq!("UTF-8".parse::<SourceEncoding>().unwrap(), SourceEncoding::Utf8);
        assert_eq!("cp1252".parse::<SourceEncoding>().unwrap(), SourceEncoding::Windows1252);
        assert!("ebcdic".parse::<SourceEncoding>().is_err());
    }

    #[test]
    fn parses_delimiters() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            [csv]
            delimiter = ","
            encoding = "utf8"
            [csv.aliases]
            name = ["Libelle", "Nom_commune"]
            "#,
        )
        .unwrap();

        let mut opts = CsvOptions::default();
        file.apply(&mut opts, Path::new("test.toml")).unwrap();
        assert_eq!(opts.delimiter, b',');
        assert_eq!(opts.encoding, SourceEncoding::Utf8);
        assert_eq!(opts.aliases.name[0], "Libelle");
        assert_eq!(opts.aliases.name[1], "Nom_commune");
        assert_eq!(
            opts.aliases.name.iter().filter(|s| *s == "Nom_commune").count(),
            1
        );
        assert_eq!(opts.aliases.postal_code, ColumnAliases::default().postal_code);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<ConfigFile>("[csv]\nseparator = \";\"\n").is_err());
    }
}
