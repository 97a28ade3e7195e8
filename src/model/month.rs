use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month using the three-letter labels stored in the shared sheet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

serde_plain::derive_display_from_serialize!(Month);
serde_plain::derive_fromstr_from_deserialize!(Month);

/// A Buddhist-era year label, e.g. "2567". The remote sheet stores these as
/// plain strings, so the inner representation stays a string too.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(String);

impl Year {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = anyhow::Error;

    /// Accepts a four-digit Buddhist-era year. The range check catches the
    /// common mistake of entering a Gregorian year.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: u32 = trimmed
            .parse()
            .with_context(|| format!("'{trimmed}' is not a numeric year"))?;
        ensure!(
            (2400..=2699).contains(&value),
            "'{trimmed}' is not a Buddhist-era year, expected something like 2567"
        );
        Ok(Self(trimmed.to_string()))
    }
}
