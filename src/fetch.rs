use std::thread;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Retry budget for a whole paginated walk.
pub const RETRY: usize = 3;

/// Safety margin added to every inter-request delay to stay under the limit.
const SLEEP_BUFFER_MS: u64 = 100;

/// Slack Web API rate-limit tiers.
///
/// ref. https://api.slack.com/docs/rate-limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl Tier {
    fn requests_per_minute(self) -> u64 {
        match self {
            Tier::Tier1 => 1,
            Tier::Tier2 => 20,
            Tier::Tier3 => 50,
            Tier::Tier4 => 100,
        }
    }

    /// Minimum delay between successive requests in this tier.
    pub fn delay(self) -> Duration {
        Duration::from_millis(60_000 / self.requests_per_minute() + SLEEP_BUFFER_MS)
    }
}

/// One page of a cursor-paginated endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page, `None` when this was the last one.
    pub next_cursor: Option<String>,
}

/// Walks a cursor-paginated endpoint to the end, accumulating all items.
///
/// `fetch_page` is invoked with the current cursor (`None` for the first
/// page); `delay` is slept between successive page requests. The first error
/// aborts the walk and nothing accumulated so far is returned.
pub fn paginate<T, F>(delay: Duration, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(cursor.as_deref())?;
        items.extend(page.items);

        match page.next_cursor {
            Some(next) => {
                cursor = Some(next);
                thread::sleep(delay);
            }
            None => break,
        }
    }

    Ok(items)
}

/// Runs `op` up to `attempts` times, rerunning only on transient errors.
/// A rate-limit error waits out its `Retry-After` interval first.
///
/// A retry restarts the operation from scratch: a partially accumulated
/// paginated walk is discarded and begins again at the first page. Fatal
/// errors are returned immediately; after the budget is exhausted the last
/// transient error is returned.
pub fn with_retry<T, F>(attempts: usize, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut result = op();

    for _ in 1..attempts {
        match &result {
            Err(err) if err.is_transient() => {
                eprintln!("Error: {err}");
                if let AppError::SlackRateLimit { retry_after_secs } = err {
                    thread::sleep(Duration::from_secs(*retry_after_secs));
                }
                result = op();
            }
            _ => break,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn page(items: &[u32], next: Option<&str>) -> Page<u32> {
        Page {
            items: items.to_vec(),
            next_cursor: next.map(String::from),
        }
    }

    #[test]
    fn test_tier_delays() {
        assert_eq!(Tier::Tier1.delay(), Duration::from_millis(60_100));
        assert_eq!(Tier::Tier2.delay(), Duration::from_millis(3_100));
        assert_eq!(Tier::Tier3.delay(), Duration::from_millis(1_300));
        assert_eq!(Tier::Tier4.delay(), Duration::from_millis(700));
    }

    #[test]
    fn test_paginate_single_page() {
        let result = paginate(Duration::ZERO, |cursor| {
            assert!(cursor.is_none());
            Ok(page(&[1, 2, 3], None))
        });
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_paginate_follows_cursors() {
        let mut calls = Vec::new();
        let result = paginate(Duration::ZERO, |cursor| {
            calls.push(cursor.map(String::from));
            match cursor {
                None => Ok(page(&[1], Some("c1"))),
                Some("c1") => Ok(page(&[2], Some("c2"))),
                Some("c2") => Ok(page(&[3], None)),
                Some(other) => panic!("unexpected cursor {other}"),
            }
        });
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            calls,
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[test]
    fn test_paginate_propagates_error() {
        let result: Result<Vec<u32>> = paginate(Duration::ZERO, |cursor| match cursor {
            None => Ok(page(&[1], Some("c1"))),
            Some(_) => Err(AppError::SlackTransient("internal_error".to_string())),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_with_retry_succeeds_first_attempt() {
        let mut attempts = 0;
        let result = with_retry(RETRY, || {
            attempts += 1;
            Ok::<_, AppError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_with_retry_recovers_from_transient() {
        let mut attempts = 0;
        let result = with_retry(RETRY, || {
            attempts += 1;
            if attempts < 3 {
                Err(AppError::SlackTransient("internal_error".to_string()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_with_retry_waits_out_rate_limit() {
        let mut attempts = 0;
        let started = std::time::Instant::now();
        let result = with_retry(RETRY, || {
            attempts += 1;
            if attempts == 1 {
                Err(AppError::SlackRateLimit {
                    retry_after_secs: 1,
                })
            } else {
                Ok(9)
            }
        });

        assert_eq!(result.unwrap(), 9);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_with_retry_stops_on_fatal() {
        let mut attempts = 0;
        let result: Result<u32> = with_retry(RETRY, || {
            attempts += 1;
            Err(AppError::SlackApi("invalid_auth".to_string()))
        });
        assert!(matches!(result, Err(AppError::SlackApi(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_with_retry_exhaustion_returns_error() {
        let mut attempts = 0;
        let result: Result<Vec<u32>> = with_retry(RETRY, || {
            attempts += 1;
            // Accumulates a page before failing; the partial result must not
            // leak out through the failure path.
            let _partial = vec![1, 2, 3];
            Err(AppError::SlackTransient("service_unavailable".to_string()))
        });
        assert_eq!(attempts, RETRY);
        assert!(matches!(result, Err(AppError::SlackTransient(_))));
    }

    #[test]
    fn test_retried_paginated_walk_restarts_from_scratch() {
        let mut pages_fetched = 0;
        let mut first_cursors = Vec::new();
        let mut attempt = 0;

        let result = with_retry(RETRY, || {
            attempt += 1;
            let this_attempt = attempt;
            let mut page_in_walk = 0;
            paginate(Duration::ZERO, |cursor| {
                pages_fetched += 1;
                page_in_walk += 1;
                if page_in_walk == 1 {
                    first_cursors.push(cursor.map(String::from));
                }
                match (this_attempt, page_in_walk) {
                    // first attempt dies on the second page
                    (1, 1) => Ok(page(&[1], Some("c1"))),
                    (1, 2) => Err(AppError::SlackRateLimit {
                        retry_after_secs: 0,
                    }),
                    // second attempt completes
                    (2, 1) => Ok(page(&[1], Some("c1"))),
                    (2, 2) => Ok(page(&[2], None)),
                    other => panic!("unexpected fetch {other:?}"),
                }
            })
        });

        assert_eq!(result.unwrap(), vec![1, 2]);
        assert_eq!(pages_fetched, 4);
        // every attempt starts back at the first page
        assert_eq!(first_cursors, vec![None, None]);
    }
}
