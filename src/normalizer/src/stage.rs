// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Buckets the ordered region list of a table into age tiers.
//!
//! Row keys are expected to start with a `YYYYMM` date prefix, so key order
//! is age order: the regions holding the oldest data sort first. Tier
//! boundaries are derived from "now minus N months" and resolved to the
//! region owning each boundary key.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use snafu::{ensure, OptionExt};
use store_api::region::RegionInfo;

use crate::config::StageOptions;
use crate::error::{InvalidConfigSnafu, InvalidDatePrefixSnafu, Result};

/// Length of the `YYYYMM` date prefix.
pub const MONTH_PREFIX_LEN: usize = 6;

/// Age tier of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Hot => f.write_str("HOT"),
            Tier::Warm => f.write_str("WARM"),
            Tier::Cold => f.write_str("COLD"),
        }
    }
}

/// The three boundary keys, in `YYYYMM` textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBoundaries {
    /// Data younger than this is hot.
    pub hot_cutoff: String,
    /// Data younger than this (and older than the hot cutoff) is warm.
    pub warm_cutoff: String,
    /// Data older than this is due for archival.
    pub cold_cutoff: String,
}

impl StageBoundaries {
    pub fn compute(opts: &StageOptions, now: NaiveDate) -> Result<Self> {
        Ok(Self {
            hot_cutoff: months_before(now, opts.hot_months)?,
            warm_cutoff: months_before(now, opts.hot_months + opts.warm_months)?,
            cold_cutoff: months_before(
                now,
                opts.hot_months + opts.warm_months + opts.cold_months,
            )?,
        })
    }
}

/// One table's regions bucketed by age, each bucket in start-key order.
/// The concatenation cold ++ warm ++ hot reproduces the input list.
#[derive(Debug, Clone, Default)]
pub struct Stages {
    pub hot: Vec<RegionInfo>,
    pub warm: Vec<RegionInfo>,
    pub cold: Vec<RegionInfo>,
}

impl Stages {
    pub fn tier(&self, tier: Tier) -> &[RegionInfo] {
        match tier {
            Tier::Hot => &self.hot,
            Tier::Warm => &self.warm,
            Tier::Cold => &self.cold,
        }
    }
}

/// Formats `date` as a `YYYYMM` key prefix.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// The `YYYYMM` prefix of the month `months` before `now`.
pub fn months_before(now: NaiveDate, months: u32) -> Result<String> {
    let date = now
        .checked_sub_months(Months::new(months))
        .context(InvalidConfigSnafu {
            reason: format!("month offset {months} underflows the calendar"),
        })?;
    Ok(month_key(date))
}

/// The `YYYYMM` prefix of the month before `prefix`.
pub fn previous_month(prefix: &str) -> Result<String> {
    let (year, month) = parse_month_prefix(prefix.as_bytes())?;
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.checked_sub_months(Months::new(1)))
        .context(InvalidDatePrefixSnafu { prefix })?;
    Ok(month_key(date))
}

/// Parses the leading `YYYYMM` of a row key.
pub fn parse_month_prefix(key: &[u8]) -> Result<(i32, u32)> {
    let error = || InvalidDatePrefixSnafu {
        prefix: String::from_utf8_lossy(&key[..key.len().min(MONTH_PREFIX_LEN)]).into_owned(),
    };

    ensure!(key.len() >= MONTH_PREFIX_LEN, error());
    let prefix = &key[..MONTH_PREFIX_LEN];
    ensure!(prefix.iter().all(u8::is_ascii_digit), error());

    // Safe to unwrap: six ASCII digits.
    let digits = std::str::from_utf8(prefix).unwrap();
    let year: i32 = digits[..4].parse().unwrap();
    let month: u32 = digits[4..].parse().unwrap();
    ensure!((1..=12).contains(&month), error());

    Ok((year, month))
}

/// Index of the region whose range contains `key`, clamped to the first or
/// last region when no range covers it. `None` only for an empty list.
pub fn region_containing(regions: &[RegionInfo], key: &[u8]) -> Option<usize> {
    if regions.is_empty() {
        return None;
    }
    let idx = regions.partition_point(|r| r.start_key.as_slice() <= key);
    Some(idx.saturating_sub(1))
}

/// The regions at or after the region owning `key`. Reused to answer
/// "regions added since date X" when cloning a split pattern.
pub fn regions_at_or_after<'a>(regions: &'a [RegionInfo], key: &[u8]) -> &'a [RegionInfo] {
    match region_containing(regions, key) {
        Some(idx) => &regions[idx..],
        None => regions,
    }
}

/// The regions strictly before the region owning `key`, i.e. the ones whose
/// data is entirely older than the key's month.
pub fn regions_before<'a>(regions: &'a [RegionInfo], key: &[u8]) -> &'a [RegionInfo] {
    match region_containing(regions, key) {
        Some(idx) => &regions[..idx],
        None => regions,
    }
}

/// Splits `regions` (ordered by start key) into hot/warm/cold tiers at
/// `now`. Fails when the table's keys do not carry a date prefix.
pub fn classify(regions: &[RegionInfo], opts: &StageOptions, now: NaiveDate) -> Result<Stages> {
    if regions.is_empty() {
        return Ok(Stages::default());
    }

    // The first region's start key may be the unbounded minimum; every
    // other start key must be date-prefixed for the bucketing to hold.
    for region in regions {
        if !region.start_key.is_empty() {
            parse_month_prefix(&region.start_key)?;
        }
    }

    let boundaries = StageBoundaries::compute(opts, now)?;

    // Unwraps are safe: the list is non-empty.
    let warm_idx = region_containing(regions, boundaries.warm_cutoff.as_bytes()).unwrap();
    let hot_idx = region_containing(regions, boundaries.hot_cutoff.as_bytes()).unwrap();
    let hot_idx = hot_idx.max(warm_idx);

    Ok(Stages {
        cold: regions[..warm_idx].to_vec(),
        warm: regions[warm_idx..hot_idx].to_vec(),
        hot: regions[hot_idx..].to_vec(),
    })
}
