use std::collections::HashSet;

use chrono::{DateTime, Local, Months};

use crate::corpus;
use crate::directory::ChannelDirectory;
use crate::error::Result;
use crate::registry::CustomEmojiRegistry;
use crate::report::EmojiScope;
use crate::settings::SurveySettings;
use crate::slack::SlackClient;
use crate::tally::{self, EmojiTally};

pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Closed time interval scoping every history and replies fetch. Computed
/// once at process start; never changes during a run.
#[derive(Debug, Clone)]
pub struct SurveyWindow {
    oldest: DateTime<Local>,
    latest: DateTime<Local>,
}

impl SurveyWindow {
    /// Window ending now and starting one year earlier.
    pub fn last_year() -> Self {
        let latest = Local::now();
        let oldest = latest.checked_sub_months(Months::new(12)).unwrap_or(latest);
        Self { oldest, latest }
    }

    pub fn between(oldest: DateTime<Local>, latest: DateTime<Local>) -> Self {
        Self { oldest, latest }
    }

    pub fn oldest_ts(&self) -> String {
        slack_ts(&self.oldest)
    }

    pub fn latest_ts(&self) -> String {
        slack_ts(&self.latest)
    }

    /// "start ~ end" range for the report header.
    pub fn formatted(&self) -> String {
        format!(
            "{} ~ {}",
            self.oldest.format(DATE_FORMAT),
            self.latest.format(DATE_FORMAT)
        )
    }
}

fn slack_ts(t: &DateTime<Local>) -> String {
    format!("{}.{:06}", t.timestamp(), t.timestamp_subsec_micros())
}

/// Run-scoped survey state: the read client, the channel directory and the
/// custom emoji registry (both populated once in `init` and read-only
/// afterwards), the survey window and the survey settings.
pub struct Survey {
    client: SlackClient,
    directory: ChannelDirectory,
    registry: CustomEmojiRegistry,
    window: SurveyWindow,
    settings: SurveySettings,
}

impl Survey {
    /// Populates the directory and the registry up front, before any channel
    /// is surveyed. Either failure aborts the run.
    pub fn init(client: SlackClient, settings: SurveySettings, window: SurveyWindow) -> Result<Self> {
        println!("fetching public channel list...");
        let directory = ChannelDirectory::populate(&client, settings.page_limit)?;
        println!("fetching custom emoji list...");
        let registry = CustomEmojiRegistry::populate(&client)?;

        Ok(Self {
            client,
            directory,
            registry,
            window,
            settings,
        })
    }

    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    pub fn registry(&self) -> &CustomEmojiRegistry {
        &self.registry
    }

    pub fn window(&self) -> &SurveyWindow {
        &self.window
    }

    fn restriction(&self, scope: EmojiScope) -> Option<&HashSet<String>> {
        match scope {
            EmojiScope::Custom => Some(self.registry.set()),
            EmojiScope::All => None,
        }
    }

    /// Reads one channel's corpus (threads included) and tallies it.
    pub fn survey_channel(&self, channel_name: &str, scope: EmojiScope) -> Result<EmojiTally> {
        let messages = corpus::read(
            &self.client,
            &self.directory,
            channel_name,
            &self.window,
            self.settings.page_limit,
            true,
        )?;

        Ok(tally::tally(&messages, self.restriction(scope)))
    }

    /// Surveys every non-excluded public channel in directory order,
    /// composing the per-channel tallies. Any channel failure fails the
    /// whole survey.
    pub fn survey_all(&self, scope: EmojiScope) -> Result<EmojiTally> {
        let names = self.directory.list(&self.settings.exclude_prefixes);
        let mut result = EmojiTally::new();

        for (index, name) in names.iter().enumerate() {
            println!("surveying in {} ({}/{})...", name, index + 1, names.len());
            let sub = self.survey_channel(name, scope)?;
            result.compose(&sub);
        }

        Ok(result)
    }
}
