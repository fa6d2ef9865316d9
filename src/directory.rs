use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::fetch::{paginate, with_retry, Tier, RETRY};
use crate::slack::{Channel, SlackClient};

/// Name → identifier mapping for the workspace's non-archived public
/// channels, fetched once per run and read-only afterwards. Iteration order
/// follows the API's page order.
pub struct ChannelDirectory {
    names: Vec<String>,
    ids: HashMap<String, String>,
}

impl ChannelDirectory {
    /// Walks `conversations.list` to the end at tier-2 pacing, under the
    /// standard retry budget.
    pub fn populate(client: &SlackClient, page_limit: u32) -> Result<Self> {
        let channels = with_retry(RETRY, || {
            paginate(Tier::Tier2.delay(), |cursor| {
                client.channels_page(page_limit, cursor)
            })
        })?;

        Ok(Self::from_channels(channels))
    }

    pub(crate) fn from_channels(channels: Vec<Channel>) -> Self {
        let mut names = Vec::new();
        let mut ids = HashMap::new();

        for channel in channels {
            // the list call already excludes archived channels; this guards
            // against a source that does not
            if channel.is_archived {
                continue;
            }
            if !ids.contains_key(&channel.name) {
                names.push(channel.name.clone());
            }
            ids.insert(channel.name, channel.id);
        }

        Self { names, ids }
    }

    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.ids
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::ChannelNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Channel names whose name does not start with any of the given
    /// prefixes, in directory order.
    pub fn list(&self, excluding_prefixes: &[String]) -> Vec<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| !excluding_prefixes.iter().any(|p| name.starts_with(p.as_str())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
