// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archive Planner
//!
//! First-fit bin-packing of an ordered file list into archives bounded by
//! the estimated compressed target size. The planner never reorders: entry
//! order within an archive, and archive membership itself, follow the input
//! order exactly, which makes plans deterministic and reproducible.
//!
//! Guarantees:
//!
//! - An archive holds either files whose estimated sizes sum below the
//!   target, or exactly one file whose estimate alone reaches it (an
//!   oversize file cannot be split, so it forms its own archive).
//! - Empty input produces an empty plan; the dispatcher turns that into an
//!   `INVALID_REQUEST` job.
//! - Archive indices are assigned `0..n` in emission order.

use std::sync::Arc;

use crate::services::archive_service::ArchiveElement;
use crate::services::size_estimator::CompressionEstimator;
use crate::value_objects::{ArchiveType, TargetSize};

/// One planned archive: its elements in input order and the estimate the
/// packer accumulated for them.
#[derive(Debug, Clone)]
pub struct PlannedArchive {
    pub elements: Vec<ArchiveElement>,
    pub estimated_size: u64,
}

/// First-fit, order-preserving bin packer.
pub struct ArchivePlanner {
    estimator: Arc<dyn CompressionEstimator>,
}

impl ArchivePlanner {
    pub fn new(estimator: Arc<dyn CompressionEstimator>) -> Self {
        ArchivePlanner { estimator }
    }

    /// Groups `files` into archives whose estimated sizes stay below
    /// `target`.
    pub fn plan(
        &self,
        files: Vec<ArchiveElement>,
        archive_type: ArchiveType,
        target: TargetSize,
    ) -> Vec<PlannedArchive> {
        let mut archives: Vec<PlannedArchive> = Vec::new();
        let mut current: Vec<ArchiveElement> = Vec::new();
        let mut current_estimate: u64 = 0;

        for file in files {
            let estimate = self.estimator.estimate(file.size, archive_type);

            if current.is_empty() || current_estimate + estimate < target.bytes() {
                current.push(file);
                current_estimate += estimate;
            } else {
                archives.push(PlannedArchive {
                    elements: std::mem::take(&mut current),
                    estimated_size: current_estimate,
                });
                current.push(file);
                current_estimate = estimate;
            }
        }

        // Always flush the running archive at the end.
        if !current.is_empty() {
            archives.push(PlannedArchive {
                elements: current,
                estimated_size: current_estimate,
            });
        }

        archives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::size_estimator::RatioEstimator;
    use crate::value_objects::{EntryPath, RemotePath};

    const MB: u64 = 1024 * 1024;

    fn element(name: &str, size: u64) -> ArchiveElement {
        ArchiveElement::new(
            RemotePath::parse(&format!("file:///data/{}", name)).unwrap(),
            EntryPath::new(format!("data/{}", name)).unwrap(),
            size,
        )
    }

    fn planner(percent: u8) -> ArchivePlanner {
        ArchivePlanner::new(Arc::new(RatioEstimator::new(percent).unwrap()))
    }

    #[test]
    fn test_packs_across_target_boundary() {
        // 40 + 40 fits below 100; the third 40 starts a new archive.
        let files = vec![
            element("a", 40 * MB),
            element("b", 40 * MB),
            element("c", 40 * MB),
        ];
        let plan = planner(0).plan(files, ArchiveType::Tar, TargetSize::from_bytes(100 * MB));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].elements.len(), 2);
        assert_eq!(plan[1].elements.len(), 1);
        assert_eq!(plan[0].estimated_size, 80 * MB);
    }

    #[test]
    fn test_oversize_file_forms_own_archive() {
        let files = vec![element("big", 500 * MB)];
        let plan = planner(0).plan(files, ArchiveType::Tar, TargetSize::from_bytes(100 * MB));

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].elements.len(), 1);
        assert!(plan[0].estimated_size >= 100 * MB);
    }

    #[test]
    fn test_oversize_file_does_not_capture_followers() {
        let files = vec![element("big", 500 * MB), element("small", 1 * MB)];
        let plan = planner(0).plan(files, ArchiveType::Tar, TargetSize::from_bytes(100 * MB));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].elements[0].size, 500 * MB);
        assert_eq!(plan[1].elements[0].size, 1 * MB);
    }

    #[test]
    fn test_empty_input_empty_plan() {
        let plan = planner(0).plan(vec![], ArchiveType::Tar, TargetSize::from_bytes(100 * MB));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_estimator_ratio_affects_packing() {
        // At 50% compression two 60 MB files estimate to 30 + 30 < 100.
        let files = vec![element("a", 60 * MB), element("b", 60 * MB)];
        let plan = planner(50).plan(files, ArchiveType::Zip, TargetSize::from_bytes(100 * MB));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].estimated_size, 60 * MB);
    }

    #[test]
    fn test_order_is_preserved() {
        let files: Vec<_> = (0..10).map(|i| element(&format!("f{}", i), 30 * MB)).collect();
        let plan = planner(0).plan(files, ArchiveType::Tar, TargetSize::from_bytes(100 * MB));

        let flattened: Vec<_> = plan
            .iter()
            .flat_map(|a| a.elements.iter())
            .map(|e| e.entry_path.as_str().to_string())
            .collect();
        let expected: Vec<_> = (0..10).map(|i| format!("data/f{}", i)).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn test_determinism_across_runs() {
        let make = || {
            (0..25)
                .map(|i| element(&format!("f{}", i), (i % 7 + 1) as u64 * 10 * MB))
                .collect::<Vec<_>>()
        };
        let p = planner(25);
        let first = p.plan(make(), ArchiveType::Zip, TargetSize::from_bytes(100 * MB));
        let second = p.plan(make(), ArchiveType::Zip, TargetSize::from_bytes(100 * MB));

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.elements, b.elements);
            assert_eq!(a.estimated_size, b.estimated_size);
        }
    }
}
