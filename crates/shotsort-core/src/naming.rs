//! Canonical screenshot file names.
//!
//! Format: `Screenshot_<YYYYMMDD>_<sequence>[_<disambiguator>].png`
//!
//! ```text
//! Screenshot_20240305_1.png
//! Screenshot_20240305_2_1.png   <- `Screenshot_20240305_2.png` was taken
//! ```

use std::fmt;

use chrono::NaiveDateTime;

/// Leading component of every canonical name.
pub const PREFIX: &str = "Screenshot";

/// The one image extension shotsort handles (without the dot).
pub const EXTENSION: &str = "png";

/// A parsed canonical file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalName {
    /// Creation day as `YYYYMMDD`.
    pub date: String,
    /// Per-day sequence id reserved from the counter store.
    pub sequence: u64,
    /// Collision suffix, present only when the plain name was taken.
    pub disambiguator: Option<u64>,
}

impl CanonicalName {
    #[must_use]
    pub fn new(date: impl Into<String>, sequence: u64) -> Self {
        Self {
            date: date.into(),
            sequence,
            disambiguator: None,
        }
    }

    /// The same name with a collision suffix.
    #[must_use]
    pub fn with_disambiguator(&self, n: u64) -> Self {
        Self {
            disambiguator: Some(n),
            ..self.clone()
        }
    }

    /// Parse a bare file name (no directory part).
    ///
    /// Prefix and extension are matched case-sensitively; anything that
    /// does not fit the pattern exactly returns `None`.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_prefix(PREFIX)?
            .strip_prefix('_')?
            .strip_suffix(EXTENSION)?
            .strip_suffix('.')?;

        let mut parts = stem.split('_');
        let date = parts.next()?;
        if date.len() != 8 || !is_digits(date) {
            return None;
        }
        let sequence = parse_number(parts.next()?)?;
        let disambiguator = match parts.next() {
            Some(raw) => Some(parse_number(raw)?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            date: date.to_string(),
            sequence,
            disambiguator,
        })
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}_{}_{}", self.date, self.sequence)?;
        if let Some(n) = self.disambiguator {
            write!(f, "_{n}")?;
        }
        write!(f, ".{EXTENSION}")
    }
}

/// Counter key for a timestamp: `YYYYMMDD`.
#[must_use]
pub fn date_key(at: NaiveDateTime) -> String {
    at.format("%Y%m%d").to_string()
}

/// Month folder name for a timestamp: `YYYY-MM`.
#[must_use]
pub fn month_folder(at: NaiveDateTime) -> String {
    at.format("%Y-%m").to_string()
}

/// Whether `file_name` carries the screenshot extension, ignoring case.
#[must_use]
pub fn has_extension(file_name: &str, extension: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(s: &str) -> Option<u64> {
    if is_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}
