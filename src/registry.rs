use std::collections::HashSet;

use crate::error::Result;
use crate::fetch::{with_retry, RETRY};
use crate::slack::SlackClient;

/// Workspace-defined emoji names, fetched once per run. Used only as a
/// membership filter and as the vocabulary of the unused-emoji report.
pub struct CustomEmojiRegistry {
    names: Vec<String>,
    set: HashSet<String>,
}

impl CustomEmojiRegistry {
    /// Single `emoji.list` call under the standard retry budget. A failure
    /// propagates; it is never treated as "zero custom emoji".
    pub fn populate(client: &SlackClient) -> Result<Self> {
        let names = with_retry(RETRY, || client.emoji_names())?;
        Ok(Self::from_names(names))
    }

    fn from_names(mut names: Vec<String>) -> Self {
        names.sort();
        names.dedup();
        let set = names.iter().cloned().collect();
        Self { names, set }
    }

    /// All custom emoji names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn set(&self) -> &HashSet<String> {
        &self.set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sorted_and_deduped() {
        let registry = CustomEmojiRegistry::from_names(vec![
            "partyparrot".to_string(),
            "bufo".to_string(),
            "partyparrot".to_string(),
        ]);
        assert_eq!(registry.names(), ["bufo", "partyparrot"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_membership() {
        let registry = CustomEmojiRegistry::from_names(vec!["bufo".to_string()]);
        assert!(registry.contains("bufo"));
        assert!(!registry.contains("tada"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = CustomEmojiRegistry::from_names(vec![]);
        assert!(registry.is_empty());
        assert!(registry.set().is_empty());
    }
}
