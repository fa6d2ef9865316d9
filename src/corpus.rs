use std::thread;
use std::time::Duration;

use crate::directory::ChannelDirectory;
use crate::error::Result;
use crate::fetch::{paginate, with_retry, Page, Tier, RETRY};
use crate::slack::{Message, SlackClient};
use crate::survey::SurveyWindow;

/// Paginated access to a channel's messages and thread replies. Implemented
/// by the Slack client; tests substitute a scripted fake.
pub trait MessageSource {
    fn history_page(
        &self,
        channel_id: &str,
        window: &SurveyWindow,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>>;

    fn replies_page(
        &self,
        channel_id: &str,
        thread_ts: &str,
        window: &SurveyWindow,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>>;

    /// Delay between successive page requests. History and replies are both
    /// tier-3 methods.
    fn page_delay(&self) -> Duration {
        Tier::Tier3.delay()
    }
}

impl MessageSource for SlackClient {
    fn history_page(
        &self,
        channel_id: &str,
        window: &SurveyWindow,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        SlackClient::history_page(
            self,
            channel_id,
            &window.oldest_ts(),
            &window.latest_ts(),
            limit,
            cursor,
        )
    }

    fn replies_page(
        &self,
        channel_id: &str,
        thread_ts: &str,
        window: &SurveyWindow,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        SlackClient::replies_page(
            self,
            channel_id,
            thread_ts,
            &window.oldest_ts(),
            &window.latest_ts(),
            limit,
            cursor,
        )
    }
}

/// Reads every message a channel produced within the survey window,
/// flattened into one sequence.
///
/// Ordering is page order for top-level messages, with each page's thread
/// replies appended right after that page's batch, not globally
/// chronological. The whole walk runs under the standard retry budget and a
/// retry restarts it from the first page. Any failure, including a nested
/// thread fetch, fails the whole read; partial corpora are never returned.
pub fn read<S: MessageSource>(
    source: &S,
    directory: &ChannelDirectory,
    channel_name: &str,
    window: &SurveyWindow,
    page_limit: u32,
    include_replies: bool,
) -> Result<Vec<Message>> {
    let channel_id = directory.resolve(channel_name)?.to_string();

    with_retry(RETRY, || {
        read_once(source, &channel_id, window, page_limit, include_replies)
    })
}

fn read_once<S: MessageSource>(
    source: &S,
    channel_id: &str,
    window: &SurveyWindow,
    page_limit: u32,
    include_replies: bool,
) -> Result<Vec<Message>> {
    let delay = source.page_delay();
    let mut corpus = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = source.history_page(channel_id, window, page_limit, cursor.as_deref())?;
        println!(" -> {} messages fetched.", page.items.len());

        // phase 1: collect this page's thread roots, then take the batch
        let roots: Vec<String> = if include_replies {
            page.items
                .iter()
                .filter_map(|message| message.thread_root().map(String::from))
                .collect()
        } else {
            Vec::new()
        };
        corpus.extend(page.items);

        // phase 2: splice each thread's replies in after the page batch
        for thread_ts in &roots {
            let replies = fetch_thread(source, channel_id, thread_ts, window, page_limit)?;
            corpus.extend(replies);
        }

        match page.next_cursor {
            Some(next) => {
                cursor = Some(next);
                thread::sleep(delay);
            }
            None => break,
        }
    }

    thread::sleep(delay);
    Ok(corpus)
}

/// Full replies walk for one thread, with the thread root stripped out; the
/// root is already in the corpus as the parent message. A trailing sleep
/// keeps consecutive thread walks at tier-3 pacing even when every thread
/// fits in a single page.
fn fetch_thread<S: MessageSource>(
    source: &S,
    channel_id: &str,
    thread_ts: &str,
    window: &SurveyWindow,
    page_limit: u32,
) -> Result<Vec<Message>> {
    let messages = with_retry(RETRY, || {
        paginate(source.page_delay(), |cursor| {
            source.replies_page(channel_id, thread_ts, window, page_limit, cursor)
        })
    })?;
    println!(" ---> {} replies fetched.", messages.len());
    thread::sleep(source.page_delay());

    Ok(messages
        .into_iter()
        .filter(|message| message.ts != thread_ts)
        .collect())
}
