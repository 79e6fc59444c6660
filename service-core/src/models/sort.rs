//! Folders-first ordering shared by the server listing and the client re-sort.

use super::entry::FileEntry;
use chrono::{DateTime, FixedOffset};
use icu_collator::{Collator, CollatorOptions, Numeric, Strength};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "modifiedTime")]
    ModifiedTime,
    #[serde(rename = "size")]
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "modifiedTime" | "modified_time" => Ok(SortField::ModifiedTime),
            "size" => Ok(SortField::Size),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortField::Name => "name",
            SortField::ModifiedTime => "modifiedTime",
            SortField::Size => "size",
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

thread_local! {
    static NAME_COLLATOR: Option<Collator> = name_collator();
}

/// Root-locale collation, accent-aware but case-blind, with digit runs
/// compared by value.
fn name_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    options.numeric = Some(Numeric::On);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            tracing::warn!(error = %e, "Collator unavailable, falling back to digit-aware order");
            None
        }
    }
}

/// Locale-aware, digit-aware name comparison (`file2` < `file10`,
/// `École` between `delta` and `zebra`).
///
/// Falls back to the raw names so that distinct names never compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NAME_COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => alphanumeric_sort::compare_str(a.to_lowercase(), b.to_lowercase()),
        })
        .then_with(|| a.cmp(b))
}

fn parse_time(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|v| DateTime::parse_from_rfc3339(v).ok())
}

fn compare_field(a: &FileEntry, b: &FileEntry, field: SortField) -> Ordering {
    match field {
        SortField::Name => compare_names(&a.name, &b.name),
        SortField::Size => a.size.cmp(&b.size),
        SortField::ModifiedTime => parse_time(a.modified_time.as_deref())
            .cmp(&parse_time(b.modified_time.as_deref())),
    }
}

/// Stable sort with folders always ahead of files.
///
/// `order` flips only the field comparison, never the folder grouping.
pub fn sort_entries(entries: &mut [FileEntry], field: SortField, order: SortOrder) {
    entries.sort_by(|a, b| match (a.is_folder, b.is_folder) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => {
            let ordering = compare_field(a, b, field);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    });
}
