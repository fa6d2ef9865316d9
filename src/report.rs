use std::collections::BTreeMap;

use crate::survey::SurveyWindow;

/// Which emoji vocabulary a survey counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiScope {
    Custom,
    All,
}

/// Which channels a survey covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyScope {
    /// A single channel, rendered as a `<#id>` reference (Slack expands it
    /// to the channel name).
    Channel { id: String },
    AllPublic,
}

/// Ranking variant with its own parameters, decided once at the operator
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportMode {
    /// Most-used emoji, posted to a channel.
    Top {
        limit: usize,
        emoji_scope: EmojiScope,
        post_channel: String,
    },
    /// Custom emoji used at most `limit` times, printed rather than posted
    /// (the grouped list is too long for a message).
    Unused { limit: u64 },
}

impl ReportMode {
    pub fn emoji_scope(&self) -> EmojiScope {
        match self {
            ReportMode::Top { emoji_scope, .. } => *emoji_scope,
            // only custom emoji make sense for an unused ranking
            ReportMode::Unused { .. } => EmojiScope::Custom,
        }
    }
}

/// Header block stating ranking type, survey scope, emoji scope and window.
pub fn header(mode: &ReportMode, scope: &SurveyScope, window: &SurveyWindow) -> String {
    let mut out = String::new();

    match mode {
        ReportMode::Top { limit, .. } => {
            out.push_str(&format!("*Emoji ranking* Top {limit}\n\n"));
        }
        ReportMode::Unused { limit } => {
            out.push_str(&format!("*Unused emoji ranking* Under {limit}\n\n"));
        }
    }

    out.push_str("scope: ");
    match scope {
        SurveyScope::Channel { id } => out.push_str(&format!("<#{id}>\n")),
        SurveyScope::AllPublic => {
            out.push_str("all public channels (excluding reserved prefixes)\n")
        }
    }

    out.push_str("emoji: ");
    match mode.emoji_scope() {
        EmojiScope::Custom => out.push_str("custom emoji only\n"),
        EmojiScope::All => out.push_str("all emoji\n"),
    }

    out.push_str(&format!("period: {}\n\n", window.formatted()));
    out
}

/// Ranked `> :name: : count` lines.
pub fn top_body(entries: &[(String, u64)]) -> String {
    let mut out = String::new();
    for (name, count) in entries {
        out.push_str(&format!("> :{name}: : {count}\n"));
    }
    out
}

/// One `*count*` section per bucket, emoji rendered as `:name:` references.
pub fn unused_body(grouped: &BTreeMap<u64, Vec<String>>) -> String {
    let mut out = String::new();
    for (count, names) in grouped {
        out.push_str(&format!("*{count}*\n"));
        if !names.is_empty() {
            let joined: Vec<String> = names.iter().map(|name| format!(":{name}:")).collect();
            out.push_str(&joined.join(" "));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
