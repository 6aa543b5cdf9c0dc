//! Joins committed offsets with watermarks.

use crate::observer::Observer;
use crate::offsets::{GroupOffsets, TopicOffsets, NO_OFFSET};

/// How far `committed` trails `watermark`, never negative.
///
/// A committed offset can briefly run ahead of a watermark fetched a moment earlier.
pub fn lag(watermark: i64, committed: i64) -> i64 {
    watermark.saturating_sub(committed).max(0)
}

/// Reports the lag of every committed partition that has a watermark.
///
/// Partitions without a committed offset ([`NO_OFFSET`]) or without a watermark are skipped.
/// Returns how many values were reported.
pub fn observe_lag(
    observer: &dyn Observer,
    watermarks: &TopicOffsets,
    groups: &GroupOffsets,
) -> usize {
    let mut observed = 0;

    for (group, topics) in groups.groups() {
        for (topic, partition, committed) in topics.iter() {
            if committed == NO_OFFSET {
                continue;
            }

            let Some(watermark) = watermarks.get(topic, partition) else {
                continue;
            };

            observer.observe(group, topic, partition, lag(watermark, committed));
            observed += 1;
        }
    }

    observed
}
