//! Cluster-wide offset maps, rebuilt from scratch every poll cycle.
//!
//! Each key is reported by exactly one broker (the partition leader for watermarks, the group
//! coordinator for committed offsets), so merging per-broker maps is a plain union.

use std::collections::BTreeMap;

use serde::Serialize;

/// Committed offset of a partition the group never committed to.
pub const NO_OFFSET: i64 = -1;

/// `topic -> partition -> offset`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopicOffsets(BTreeMap<String, BTreeMap<i32, i64>>);

impl TopicOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic: &str, partition: i32, offset: i64) {
        match self.0.get_mut(topic) {
            Some(partitions) => {
                partitions.insert(partition, offset);
            }
            None => {
                self.0
                    .insert(topic.to_string(), BTreeMap::from([(partition, offset)]));
            }
        }
    }

    pub fn get(&self, topic: &str, partition: i32) -> Option<i64> {
        self.0.get(topic)?.get(&partition).copied()
    }

    pub fn topic(&self, topic: &str) -> Option<&BTreeMap<i32, i64>> {
        self.0.get(topic)
    }

    /// Unions `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (topic, partitions) in other.0 {
            let into = self.0.entry(topic).or_default();
            for (partition, offset) in partitions {
                let _prev = into.insert(partition, offset);
                debug_assert!(
                    _prev.map_or(true, |prev| prev == offset),
                    "partition {partition} reported twice with different offsets"
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of `(topic, partition)` entries.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32, i64)> {
        self.0.iter().flat_map(|(topic, partitions)| {
            partitions
                .iter()
                .map(move |(&partition, &offset)| (topic.as_str(), partition, offset))
        })
    }

    /// Drops the topic if it ends up with no partitions.
    pub(crate) fn insert_topic(&mut self, topic: String, partitions: BTreeMap<i32, i64>) {
        if !partitions.is_empty() {
            self.0.insert(topic, partitions);
        }
    }
}

impl FromIterator<(String, i32, i64)> for TopicOffsets {
    fn from_iter<I: IntoIterator<Item = (String, i32, i64)>>(iter: I) -> Self {
        let mut offsets = Self::new();
        for (topic, partition, offset) in iter {
            offsets.insert(&topic, partition, offset);
        }
        offsets
    }
}

/// `group -> topic -> partition -> committed offset`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupOffsets(BTreeMap<String, TopicOffsets>);

impl GroupOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: &str, topic: &str, partition: i32, offset: i64) {
        self.0
            .entry(group.to_string())
            .or_default()
            .insert(topic, partition, offset);
    }

    /// Sets all offsets of `group` at once; a group with no offsets is not recorded.
    pub fn insert_group(&mut self, group: String, offsets: TopicOffsets) {
        if !offsets.is_empty() {
            self.0.insert(group, offsets);
        }
    }

    pub fn get(&self, group: &str, topic: &str, partition: i32) -> Option<i64> {
        self.0.get(group)?.get(topic, partition)
    }

    /// Unions `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (group, topics) in other.0 {
            self.0.entry(group).or_default().merge(topics);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &TopicOffsets)> {
        self.0.iter().map(|(group, topics)| (group.as_str(), topics))
    }
}
