use std::io::BufRead;

use crate::error::Result;
use crate::fetch::{with_retry, RETRY};
use crate::prompt::Prompter;
use crate::report::{self, ReportMode, SurveyScope};
use crate::settings::Settings;
use crate::slack::SlackClient;
use crate::survey::{Survey, SurveyWindow};
use crate::tally;

/// Runs one interactive survey: collect credentials and choices, walk the
/// selected channels, and deliver the report.
pub fn run_survey() -> Result<()> {
    let settings = Settings::load()?;
    let mut prompter = Prompter::stdin();

    let read_token = resolve_token("SLACK_TOKEN", "User OAuth Token", &mut prompter)?;
    let post_token = resolve_token("SLACK_BOT_TOKEN", "Bot User OAuth Token", &mut prompter)?;

    let survey = Survey::init(
        SlackClient::new(read_token),
        settings.survey,
        SurveyWindow::last_year(),
    )?;

    let plan = prompter.survey_plan(survey.directory())?;

    println!("\nstart surveying...\n");

    let scope = match &plan.target {
        Some(name) => SurveyScope::Channel {
            id: survey.directory().resolve(name)?.to_string(),
        },
        None => SurveyScope::AllPublic,
    };

    let counts = match &plan.target {
        Some(name) => survey.survey_channel(name, plan.mode.emoji_scope())?,
        None => survey.survey_all(plan.mode.emoji_scope())?,
    };

    let header = report::header(&plan.mode, &scope, survey.window());

    match &plan.mode {
        ReportMode::Top {
            limit,
            post_channel,
            ..
        } => {
            let entries = tally::top_n(&counts, *limit);
            let message = header + &report::top_body(&entries);
            post_report(&SlackClient::new(post_token), post_channel, &message);
        }
        ReportMode::Unused { limit } => {
            let grouped = tally::under_n_grouped(&counts, survey.registry().names(), *limit);
            let message = header + &report::unused_body(&grouped);
            println!("--------\n\n{message}\n--------");
        }
    }

    println!("\nend surveying.\n");
    Ok(())
}

/// Env var first, interactive prompt as fallback. A prompt failure (closed
/// stdin, read error) propagates as-is.
fn resolve_token<R: BufRead>(
    var: &str,
    label: &str,
    prompter: &mut Prompter<R>,
) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => prompter.token(label),
    }
}

/// Best-effort delivery: on failure the report is printed instead and the
/// run still succeeds.
fn post_report(client: &SlackClient, channel: &str, message: &str) {
    match with_retry(RETRY, || client.post_message(channel, message)) {
        Ok(()) => println!("succeeded to post the report to #{channel}"),
        Err(err) => {
            eprintln!("Failed to post the report to #{channel}: {err}");
            println!("--------\n\n{message}\n--------");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::error::AppError;

    fn prompter(lines: &str) -> Prompter<Cursor<Vec<u8>>> {
        Prompter::new(Cursor::new(lines.as_bytes().to_vec()))
    }

    #[test]
    fn test_resolve_token_falls_back_to_prompt() {
        let mut p = prompter("xoxp-123\n");
        let token = resolve_token("SLACK_EMOJI_SURVEY_UNSET_VAR", "User OAuth Token", &mut p);
        assert_eq!(token.unwrap(), "xoxp-123");
    }

    #[test]
    fn test_resolve_token_surfaces_prompt_failure() {
        // closed input: the underlying read error must come through, not a
        // generic missing-credential message
        let mut p = prompter("");
        let result = resolve_token("SLACK_EMOJI_SURVEY_UNSET_VAR", "User OAuth Token", &mut p);
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
