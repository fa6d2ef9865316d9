use std::io::{self, BufRead, Write};

use crate::directory::ChannelDirectory;
use crate::error::Result;
use crate::report::{EmojiScope, ReportMode};

/// Everything the operator chose for one run: the ranking variant and the
/// survey target (`None` = all non-excluded public channels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyPlan {
    pub mode: ReportMode,
    pub target: Option<String>,
}

/// Line-based prompter. Reads answers from any `BufRead` so the flow is
/// testable with a cursor; production uses locked stdin.
pub struct Prompter<R> {
    input: R,
}

impl Prompter<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> Prompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(line.trim().to_string())
    }

    /// Asks until `validate` accepts the answer; a rejection prints its
    /// message and re-prompts in place.
    fn ask_until<T>(
        &mut self,
        question: &str,
        mut validate: impl FnMut(&str) -> std::result::Result<T, String>,
    ) -> Result<T> {
        loop {
            let answer = self.ask(question)?;
            match validate(&answer) {
                Ok(value) => return Ok(value),
                Err(message) => println!("{message}"),
            }
        }
    }

    /// Prompts for a credential that was not found in the environment.
    pub fn token(&mut self, label: &str) -> Result<String> {
        self.ask_until(&format!("{label}: "), |answer| {
            if answer.is_empty() {
                Err("A token is required. Try again.".to_string())
            } else {
                Ok(answer.to_string())
            }
        })
    }

    /// Runs the full operator sequence: ranking type, limit, survey target
    /// and, for top mode, destination channel and emoji scope.
    pub fn survey_plan(&mut self, directory: &ChannelDirectory) -> Result<SurveyPlan> {
        let top = self.ranking_is_top()?;
        let limit = self.ranking_limit(top)?;
        let target = self.survey_target(top, directory)?;

        let mode = if top {
            let post_channel = self.post_channel(directory)?;
            let emoji_scope = self.emoji_scope()?;
            ReportMode::Top {
                limit: limit as usize,
                emoji_scope,
                post_channel,
            }
        } else {
            ReportMode::Unused { limit }
        };

        Ok(SurveyPlan { mode, target })
    }

    fn ranking_is_top(&mut self) -> Result<bool> {
        self.ask_until("Choose ranking type [top/unused]: ", |answer| {
            match answer {
                "top" => Ok(true),
                "unused" => Ok(false),
                _ => Err("Invalid ranking type. Try again.".to_string()),
            }
        })
    }

    fn ranking_limit(&mut self, top: bool) -> Result<u64> {
        let default = if top { 10 } else { 0 };
        self.ask_until(
            &format!("Choose ranking limit (default: {default}): "),
            |answer| {
                if answer.is_empty() {
                    return Ok(default);
                }
                answer
                    .parse()
                    .map_err(|_| "Invalid ranking limit. Need to input a number. Try again.".to_string())
            },
        )
    }

    fn survey_target(&mut self, top: bool, directory: &ChannelDirectory) -> Result<Option<String>> {
        loop {
            let answer = if top {
                self.ask("Channel name to survey (default: all channels): ")?
            } else {
                let keep_all = self.ask(
                    "Surveying all channels is recommended for the unused ranking. Are you sure? [Y/n]: ",
                )?;
                if keep_all == "n" {
                    self.ask("Channel name to survey (default: all channels): ")?
                } else {
                    String::new()
                }
            };

            if answer.is_empty() {
                if top {
                    let confirm =
                        self.ask("It takes a long time to survey all channels. Continue? [y/N]: ")?;
                    if confirm != "y" {
                        continue;
                    }
                    println!("continue.");
                }
                return Ok(None);
            }

            if !directory.contains(&answer) {
                println!("Error: invalid channel name. Try again.");
                continue;
            }
            return Ok(Some(answer));
        }
    }

    fn post_channel(&mut self, directory: &ChannelDirectory) -> Result<String> {
        self.ask_until("Channel name to post the report to: ", |answer| {
            if directory.contains(answer) {
                Ok(answer.to_string())
            } else {
                Err("Error: invalid channel name. Try again.".to_string())
            }
        })
    }

    fn emoji_scope(&mut self) -> Result<EmojiScope> {
        self.ask_until(
            "Choose emoji type [custom/all] (default: all): ",
            |answer| match answer {
                "" | "all" => Ok(EmojiScope::All),
                "custom" => Ok(EmojiScope::Custom),
                _ => Err("Error: invalid emoji type. Choose [custom/all]. Try again.".to_string()),
            },
        )
    }
}
