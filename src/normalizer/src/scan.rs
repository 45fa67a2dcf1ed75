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

//! The single scanning pass shared by every sizing metric.
//!
//! One cursor walks the ordered region list, testing the split condition
//! first and, failing that, the merge condition against the immediate right
//! neighbor. A merge consumes the neighbor, so the cursor advances an extra
//! step and no region ends up in two actions. The optional quota stops the
//! scan once enough actions are queued to reach a count target.

use common_telemetry::info;
use store_api::region::RegionInfo;

use crate::load::RegionSizeSnapshot;
use crate::plan::NormalizationAction;

/// Split condition tested at the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SplitTrigger {
    Disabled,
    /// Split every candidate; used to grow a single-region table.
    Unconditional,
    /// Absolute ceiling in MB.
    SizeExceeds { max_size_mb: u64 },
    /// Relative ceiling against the list average.
    FactorOfAverage { factor: f64, average: f64 },
    /// Any region above the average; used when growing toward a count.
    ExceedsAverage { average: f64 },
    /// Absolute ceiling or relative ceiling, whichever fires first. Both
    /// firing on the same region still yields one action.
    SizeOrFactorOfAverage {
        max_size_mb: u64,
        factor: f64,
        average: f64,
    },
}

impl SplitTrigger {
    fn fires(&self, size_mb: u64) -> bool {
        match *self {
            SplitTrigger::Disabled => false,
            SplitTrigger::Unconditional => true,
            SplitTrigger::SizeExceeds { max_size_mb } => size_mb > max_size_mb,
            SplitTrigger::FactorOfAverage { factor, average } => size_mb as f64 > factor * average,
            SplitTrigger::ExceedsAverage { average } => size_mb as f64 > average,
            SplitTrigger::SizeOrFactorOfAverage {
                max_size_mb,
                factor,
                average,
            } => size_mb > max_size_mb || size_mb as f64 > factor * average,
        }
    }
}

/// Merge condition tested against the right neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MergeTrigger {
    Disabled,
    /// Pair every neighbor; used to shrink toward a count regardless of
    /// sizes.
    Unconditional,
    /// The combined region would still be below the average.
    PairSumBelowAverage { average: f64 },
    /// Both halves are individually below the average.
    BothBelowAverage { average: f64 },
}

impl MergeTrigger {
    fn enabled(&self) -> bool {
        !matches!(self, MergeTrigger::Disabled)
    }

    fn fires(&self, left_mb: u64, right_mb: u64) -> bool {
        match *self {
            MergeTrigger::Disabled => false,
            MergeTrigger::Unconditional => true,
            MergeTrigger::PairSumBelowAverage { average } => {
                ((left_mb + right_mb) as f64) < average
            }
            MergeTrigger::BothBelowAverage { average } => {
                (left_mb as f64) < average && (right_mb as f64) < average
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanParams {
    pub split: SplitTrigger,
    pub merge: MergeTrigger,
    /// Remaining action budget; `None` is unlimited.
    pub quota: Option<usize>,
}

/// Walks `regions` once and emits the actions the triggers fire on.
pub(crate) fn scan_regions(
    regions: &[RegionInfo],
    sizes: &RegionSizeSnapshot,
    params: &ScanParams,
) -> Vec<NormalizationAction> {
    let mut actions = Vec::new();
    let mut quota = params.quota;
    if quota == Some(0) {
        return actions;
    }

    let mut idx = 0;
    while idx < regions.len() {
        let region = &regions[idx];
        let size_mb = sizes.size_mb(region);

        if params.split.fires(size_mb) {
            info!(
                "large region {} has size {} MB, splitting",
                region.name, size_mb
            );
            actions.push(NormalizationAction::Split {
                region: region.clone(),
                split_key: None,
            });
            if !consume(&mut quota) {
                break;
            }
        } else if params.merge.enabled() {
            if idx + 1 == regions.len() {
                break;
            }
            let neighbor = &regions[idx + 1];
            let neighbor_mb = sizes.size_mb(neighbor);
            if params.merge.fires(size_mb, neighbor_mb) {
                info!(
                    "small regions {} ({} MB) and {} ({} MB), merging",
                    region.name, size_mb, neighbor.name, neighbor_mb
                );
                actions.push(NormalizationAction::Merge {
                    left: region.clone(),
                    right: neighbor.clone(),
                    force: false,
                });
                // The neighbor is consumed by the merge.
                idx += 1;
                if !consume(&mut quota) {
                    break;
                }
            }
        }
        idx += 1;
    }

    actions
}

/// Decrements the quota; false once it is exhausted.
fn consume(quota: &mut Option<usize>) -> bool {
    match quota {
        None => true,
        Some(remaining) => {
            *remaining -= 1;
            *remaining > 0
        }
    }
}

#[cfg(test)]
mod tests {
    use store_api::region::RegionName;
    use store_api::table::TableName;

    use super::*;

    fn regions_with_sizes(sizes_mb: &[u64]) -> (Vec<RegionInfo>, RegionSizeSnapshot) {
        let table = TableName::parse("default:t");
        let regions = sizes_mb
            .iter()
            .enumerate()
            .map(|(i, _)| {
                RegionInfo::new(
                    format!("r{i}"),
                    table.clone(),
                    format!("{i:06}").into_bytes(),
                    if i + 1 == sizes_mb.len() {
                        vec![]
                    } else {
                        format!("{:06}", i + 1).into_bytes()
                    },
                )
            })
            .collect::<Vec<_>>();
        let snapshot = RegionSizeSnapshot::from_sizes(
            regions
                .iter()
                .zip(sizes_mb)
                .map(|(r, size)| (r.name.clone(), *size)),
        );
        (regions, snapshot)
    }

    fn names(actions: &[NormalizationAction]) -> Vec<String> {
        actions
            .iter()
            .map(|action| match action {
                NormalizationAction::Split { region, .. } => format!("split:{}", region.name),
                NormalizationAction::Merge { left, right, .. } => {
                    format!("merge:{}+{}", left.name, right.name)
                }
            })
            .collect()
    }

    fn name(region: &RegionName) -> &str {
        region.as_str()
    }

    #[test]
    fn test_average_scan_merge_consumes_neighbor() {
        // avg = 10; r1+r2 merge, the cursor skips r2, r3+r4 merge next.
        let (regions, sizes) = regions_with_sizes(&[36, 1, 1, 1, 1]);
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::FactorOfAverage {
                    factor: 2.0,
                    average: 8.0,
                },
                merge: MergeTrigger::PairSumBelowAverage { average: 8.0 },
                quota: None,
            },
        );
        assert_eq!(
            vec!["split:r0", "merge:r1+r2", "merge:r3+r4"],
            names(&actions)
        );
    }

    #[test]
    fn test_no_region_in_two_actions() {
        let (regions, sizes) = regions_with_sizes(&[1, 1, 1, 1]);
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::Disabled,
                merge: MergeTrigger::Unconditional,
                quota: None,
            },
        );
        let mut seen = std::collections::HashSet::new();
        for action in &actions {
            match action {
                NormalizationAction::Merge { left, right, .. } => {
                    assert!(seen.insert(name(&left.name).to_string()));
                    assert!(seen.insert(name(&right.name).to_string()));
                }
                _ => unreachable!(),
            }
        }
        assert_eq!(vec!["merge:r0+r1", "merge:r2+r3"], names(&actions));
    }

    #[test]
    fn test_quota_stops_the_scan() {
        let (regions, sizes) = regions_with_sizes(&[1, 1, 1, 1, 1, 1]);
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::Disabled,
                merge: MergeTrigger::Unconditional,
                quota: Some(2),
            },
        );
        assert_eq!(vec!["merge:r0+r1", "merge:r2+r3"], names(&actions));

        let none = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::Disabled,
                merge: MergeTrigger::Unconditional,
                quota: Some(0),
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_size_ceiling_ignores_last_element_guard() {
        // A split-only scan visits the last region too.
        let (regions, sizes) = regions_with_sizes(&[1, 1, 42]);
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::SizeExceeds { max_size_mb: 10 },
                merge: MergeTrigger::Disabled,
                quota: None,
            },
        );
        assert_eq!(vec!["split:r2"], names(&actions));
    }

    #[test]
    fn test_combined_trigger_emits_one_action() {
        // 50 MB exceeds both the 10 MB ceiling and 2x the 17.3 MB average;
        // still a single split.
        let (regions, sizes) = regions_with_sizes(&[50, 1, 1]);
        let average = sizes.average_mb(&regions).unwrap();
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::SizeOrFactorOfAverage {
                    max_size_mb: 10,
                    factor: 2.0,
                    average,
                },
                merge: MergeTrigger::PairSumBelowAverage { average },
                quota: None,
            },
        );
        assert_eq!(vec!["split:r0", "merge:r1+r2"], names(&actions));
    }

    #[test]
    fn test_balanced_regions_yield_nothing() {
        // avg = 3, factor 2: 3 <= 6 and pair sum 6 is not < 3.
        let (regions, sizes) = regions_with_sizes(&[3, 3]);
        let actions = scan_regions(
            &regions,
            &sizes,
            &ScanParams {
                split: SplitTrigger::FactorOfAverage {
                    factor: 2.0,
                    average: 3.0,
                },
                merge: MergeTrigger::PairSumBelowAverage { average: 3.0 },
                quota: None,
            },
        );
        assert!(actions.is_empty());
    }
}
