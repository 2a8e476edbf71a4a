//! Rank keys for ordering entities inside a container.

use crate::error::{BoardError, Result};
use crate::lexorank::{symbol_index, DEFAULT_BUCKET, SENTINEL, SEPARATOR};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering key of a card within its list, or of a list within its board.
///
/// Ranks are stored in their full envelope form `"<bucket>|<payload>:"`, where the
/// payload is a non-empty base-36 string. The total order compares the bucket first,
/// then the payload symbol by symbol by alphabet index, with a proper prefix sorting
/// before any of its extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rank(String);

impl Rank {
    /// Parse a rank from its envelope form.
    ///
    /// A bare payload (`"hzzzzz"`) is accepted and placed in the default bucket.
    pub fn parse(s: &str) -> Result<Self> {
        let (bucket, rest) = match s.char_indices().nth(1) {
            Some((idx, c)) if c == SEPARATOR => {
                let bucket = s[..idx].chars().next().unwrap_or(DEFAULT_BUCKET);
                (bucket, &s[idx + c.len_utf8()..])
            }
            _ => (DEFAULT_BUCKET, s),
        };
        if symbol_index(bucket).is_none() {
            return Err(BoardError::invalid_rank(
                s,
                format!("bucket '{}' is outside the rank alphabet", bucket),
            ));
        }

        let payload = rest.strip_suffix(SENTINEL).unwrap_or(rest);
        if payload.is_empty() {
            return Err(BoardError::invalid_rank(s, "payload is empty"));
        }
        if let Some(bad) = payload.chars().find(|c| symbol_index(*c).is_none()) {
            return Err(BoardError::invalid_rank(
                s,
                format!("unexpected symbol '{}'", bad),
            ));
        }

        Ok(Self::from_parts(bucket, payload))
    }

    /// Build a rank in the default bucket from a payload
    pub fn from_payload(payload: &str) -> Result<Self> {
        Self::parse(payload)
    }

    /// Assemble an envelope from parts that are already known to be valid
    pub(crate) fn from_parts(bucket: char, payload: &str) -> Self {
        Self(format!("{}{}{}{}", bucket, SEPARATOR, payload, SENTINEL))
    }

    /// The bucket symbol of this rank
    pub fn bucket(&self) -> char {
        self.0.chars().next().unwrap_or(DEFAULT_BUCKET)
    }

    /// The base-36 payload, without bucket prefix or sentinel
    pub fn payload(&self) -> &str {
        let inner = self.0.strip_suffix(SENTINEL).unwrap_or(&self.0);
        inner
            .split_once(SEPARATOR)
            .map(|(_, payload)| payload)
            .unwrap_or(inner)
    }

    /// Get the full envelope string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_index = |c: char| symbol_index(c).unwrap_or(u8::MAX);
        by_index(self.bucket())
            .cmp(&by_index(other.bucket()))
            .then_with(|| {
                self.payload()
                    .chars()
                    .map(by_index)
                    .cmp(other.payload().chars().map(by_index))
            })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Rank {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rank {
    type Error = BoardError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}
