//! Column mapping from loosely named CSV headers to canonical frequency bands
//!
//! Measurement files name their band columns inconsistently (`1000`,
//! `freq_1000`, `F1000`, `F1000 (dB)`, ...). This module resolves each
//! canonical band to at most one header. The first column always holds the
//! row identifier and is never mapped to a band.

use std::collections::{BTreeMap, HashSet};

use crate::app::models::FrequencyBand;
use crate::constants::ALIAS_PREFIXES;
use crate::{Error, Result};
use csv::StringRecord;

/// A header resolved for one band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandColumn {
    /// Header text as it appears in the file (trimmed)
    pub name: String,
    /// Position of the column in each record
    pub index: usize,
}

/// Band-to-column mapping for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Header of the identifier column (always index 0)
    pub identifier_column: String,

    /// Resolved band columns; bands without a matching header are absent
    pub band_columns: BTreeMap<FrequencyBand, BandColumn>,

    /// Total number of columns in the header row
    pub total_columns: usize,
}

impl ColumnMapping {
    /// Analyze a CSV header record
    pub fn analyze(headers: &StringRecord) -> Result<Self> {
        let headers: Vec<&str> = headers.iter().collect();
        Self::from_headers(&headers)
    }

    /// Resolve bands against an ordered list of headers
    ///
    /// Per band, in order of preference:
    /// 1. a header equal to one of the band's aliases (`L`, `freq_L`, `FL`)
    /// 2. a header containing an alias, not directly adjacent to other digits
    /// 3. a purely numeric header whose value equals the label (e.g. `0100`)
    ///
    /// The first match wins and a header is claimed by at most one band.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let Some(identifier_column) = headers.first() else {
            return Err(Error::data_validation(
                "CSV file has no header row or no columns",
            ));
        };

        let candidates: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, header)| (index, header.as_ref().trim()))
            .collect();

        let mut claimed: HashSet<usize> = HashSet::new();
        let mut band_columns = BTreeMap::new();

        for band in FrequencyBand::ALL {
            let aliases = aliases_for(band);

            let found = first_unclaimed(&candidates, &claimed, |header| {
                aliases.iter().any(|alias| header == alias.as_str())
            })
            .or_else(|| {
                first_unclaimed(&candidates, &claimed, |header| {
                    aliases
                        .iter()
                        .any(|alias| contains_delimited(header, alias))
                })
            })
            .or_else(|| {
                first_unclaimed(&candidates, &claimed, |header| {
                    is_numeric_label(header, band)
                })
            });

            if let Some((index, header)) = found {
                claimed.insert(index);
                band_columns.insert(
                    band,
                    BandColumn {
                        name: header.to_string(),
                        index,
                    },
                );
            }
        }

        Ok(Self {
            identifier_column: identifier_column.as_ref().trim().to_string(),
            band_columns,
            total_columns: headers.len(),
        })
    }

    /// Header mapped to a band, if any
    pub fn column_for(&self, band: FrequencyBand) -> Option<&str> {
        self.band_columns.get(&band).map(|column| column.name.as_str())
    }

    /// Bands that found a column, low to high
    pub fn mapped_bands(&self) -> Vec<FrequencyBand> {
        self.band_columns.keys().copied().collect()
    }

    /// Get statistics about the column mapping: (total columns, mapped bands)
    pub fn stats(&self) -> (usize, usize) {
        (self.total_columns, self.band_columns.len())
    }
}

fn first_unclaimed<'a>(
    candidates: &[(usize, &'a str)],
    claimed: &HashSet<usize>,
    matches: impl Fn(&str) -> bool,
) -> Option<(usize, &'a str)> {
    candidates
        .iter()
        .copied()
        .find(|(index, header)| !claimed.contains(index) && matches(header))
}

/// Known aliases for a band: bare label plus each prefixed form
fn aliases_for(band: FrequencyBand) -> Vec<String> {
    std::iter::once(band.label().to_string())
        .chain(
            ALIAS_PREFIXES
                .iter()
                .map(|prefix| format!("{}{}", prefix, band.label())),
        )
        .collect()
}

/// Substring match that refuses to split a longer number
///
/// `F1000` must not satisfy the alias `F100`, and `1100` must not satisfy `100`.
fn contains_delimited(header: &str, alias: &str) -> bool {
    header.match_indices(alias).any(|(start, _)| {
        let before = header[..start].chars().next_back();
        let after = header[start + alias.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// All-digit header whose value equals the band label
///
/// Compared by value rather than text so a zero-padded `0100` still names the
/// 100 Hz band. The substring step cannot see it because the alias `100` sits
/// right after a digit there.
fn is_numeric_label(header: &str, band: FrequencyBand) -> bool {
    !header.is_empty()
        && header.chars().all(|c| c.is_ascii_digit())
        && header.parse::<u32>().ok() == band.label().parse::<u32>().ok()
}
