// crates/communes-core/src/token.rs

//! # Department Tokenizer
//!
//! A department token partitions city records into files: two digits for
//! metropolitan departments, `2A`/`2B` for Corsica, and a three-digit prefix
//! for overseas departments and territories (`971`, `974`, `980`, ...).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisional token for Corsican postal codes that could not be split into
/// `2A`/`2B`. Never a valid department on its own.
pub const AMBIGUOUS_CORSICA: &str = "20";

const CORSICA: [&str; 2] = ["2A", "2B"];

/// Overseas tokens expected on disk, in report order.
const OVERSEAS: [&str; 7] = ["971", "972", "973", "974", "976", "975", "980"];

static EXPECTED_TOKENS: Lazy<Vec<DepartmentToken>> = Lazy::new(|| {
    (1..=95u8)
        .filter(|n| *n != 20)
        .map(|n| format!("{n:02}"))
        .chain(CORSICA.iter().map(|s| s.to_string()))
        .chain(OVERSEAS.iter().map(|s| s.to_string()))
        .map(DepartmentToken)
        .collect()
});

/// A department/grouping token such as `"69"`, `"2A"` or `"974"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentToken(String);

impl DepartmentToken {
    /// Parses a token as it appears in a file name or a `dept` field.
    ///
    /// Accepts two digits, `2A`/`2B` (upper-case only, as written on disk),
    /// or three digits starting with `97`/`98`. The provisional `"20"` is
    /// accepted so that unresolved Corsican records can still be grouped and
    /// reported.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if CORSICA.contains(&s) {
            return Some(Self(s.to_string()));
        }
        let digits = s.bytes().all(|b| b.is_ascii_digit());
        match s.len() {
            2 if digits && s != "00" => Some(Self(s.to_string())),
            3 if digits && (s.starts_with("97") || s.starts_with("98")) => {
                Some(Self(s.to_string()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_corsica(&self) -> bool {
        CORSICA.contains(&self.0.as_str())
    }

    pub fn is_overseas(&self) -> bool {
        self.0.len() == 3
    }

    /// `true` for the provisional `"20"` token awaiting manual re-routing.
    pub fn is_ambiguous_corsica(&self) -> bool {
        self.0 == AMBIGUOUS_CORSICA
    }

    /// File name holding this department: `cities_<TOKEN>.json`.
    pub fn file_name(&self) -> String {
        format!("cities_{}.json", self.0)
    }
}

impl fmt::Display for DepartmentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DepartmentToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `true` when `s` is exactly five ASCII digits.
#[inline]
pub fn is_postal_code(s: &str) -> bool {
    s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Derives the department token for a postal code.
///
/// Rules, in order:
/// 1. an administrative (INSEE) code starting with `2A`/`2B` wins, since
///    both Corsican departments share the `20xxx` postal range;
/// 2. postal codes starting with `97`/`98` keep three characters;
/// 3. everything else keeps two.
///
/// Returns `None` when the postal code is not five digits.
///
/// # Examples
/// ```rust
/// use communes_core::token::derive_token;
///
/// assert_eq!(derive_token("69001", None).unwrap().as_str(), "69");
/// assert_eq!(derive_token("97400", None).unwrap().as_str(), "974");
/// assert_eq!(derive_token("20000", Some("2A004")).unwrap().as_str(), "2A");
/// assert!(derive_token("6900", None).is_none());
/// ```
pub fn derive_token(postal_code: &str, insee: Option<&str>) -> Option<DepartmentToken> {
    let cp = postal_code.trim();
    if !is_postal_code(cp) {
        return None;
    }

    let insee = insee.map(|s| s.trim().to_ascii_uppercase()).unwrap_or_default();
    if let Some(corsica) = CORSICA.iter().find(|c| insee.starts_with(**c)) {
        return Some(DepartmentToken(corsica.to_string()));
    }

    if cp.starts_with("97") || cp.starts_with("98") {
        return Some(DepartmentToken(cp[..3].to_string()));
    }

    Some(DepartmentToken(cp[..2].to_string()))
}

/// The fixed set of tokens a complete dataset is expected to hold:
/// metropolitan `01`..`95` without `20`, then `2A`/`2B`, then the overseas
/// prefixes.
pub fn expected_tokens() -> &'static [DepartmentToken] {
    &EXPECTED_TOKENS
}
