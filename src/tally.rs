use std::collections::{BTreeMap, HashMap, HashSet};

use crate::slack::Message;

/// Emoji name → occurrence count, remembering first-insertion order so that
/// ranking ties resolve deterministically. Counts only ever grow.
#[derive(Debug, Clone, Default)]
pub struct EmojiTally {
    counts: HashMap<String, u64>,
    order: Vec<String>,
}

impl EmojiTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, count: u64) {
        match self.counts.get_mut(name) {
            Some(total) => *total += count,
            None => {
                self.counts.insert(name.to_string(), count);
                self.order.push(name.to_string());
            }
        }
    }

    /// Count for a name, 0 when absent.
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.order.iter().map(|name| (name.as_str(), self.get(name)))
    }

    /// Key-wise addition of another tally into this one.
    pub fn compose(&mut self, other: &EmojiTally) {
        for (name, count) in other.iter() {
            self.add(name, count);
        }
    }
}

fn counted(restrict_to: Option<&HashSet<String>>, name: &str) -> bool {
    restrict_to.is_none_or(|set| set.contains(name))
}

/// Tallies emoji occurrences across a message sequence.
///
/// Inline emoji elements count 1 each; a reaction counts as many as there
/// were reactors. With `restrict_to`, names outside the set are silently
/// skipped.
pub fn tally(messages: &[Message], restrict_to: Option<&HashSet<String>>) -> EmojiTally {
    let mut result = EmojiTally::new();

    for message in messages {
        for name in message.text_emoji() {
            if counted(restrict_to, name) {
                result.add(name, 1);
            }
        }

        for reaction in &message.reactions {
            if counted(restrict_to, &reaction.name) {
                result.add(&reaction.name, reaction.count);
            }
        }
    }

    result
}

/// Top `n` entries by count descending; ties keep insertion order.
pub fn top_n(tally: &EmojiTally, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = tally
        .iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}

/// Groups custom emoji names by exact usage count into buckets 0..=n.
///
/// A name absent from the tally counts as 0; a name used more than `n` times
/// is omitted entirely. Note that names used exactly `n` times still land in
/// the last bucket.
pub fn under_n_grouped(
    tally: &EmojiTally,
    custom_names: &[String],
    n: u64,
) -> BTreeMap<u64, Vec<String>> {
    let mut buckets: BTreeMap<u64, Vec<String>> = (0..=n).map(|i| (i, Vec::new())).collect();

    for name in custom_names {
        let count = tally.get(name);
        if let Some(bucket) = buckets.get_mut(&count) {
            bucket.push(name.clone());
        }
    }

    buckets
}
