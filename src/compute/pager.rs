//! Cursor pagination
//!
//! A [`Pager`] walks a paginated list call one item at a time, fetching the
//! next page only when the current one is drained. `Ok(None)` marks the end
//! of the sequence; errors are returned as `Err` and end iteration. A pager is
//! not resumable: listing again means building a new pager, which re-issues
//! the first request.

use super::model::{Instance, InstanceAggregatedList, InstanceList, InstancesScopedList};
use crate::error::{ComputeError, Result};
use crate::gcp::client::ComputeClient;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;

/// A page of a list response
pub trait Page: DeserializeOwned {
    type Item;

    /// Split into this page's items and the cursor for the next page
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for InstanceList {
    type Item = Instance;

    fn into_parts(self) -> (Vec<Instance>, Option<String>) {
        (self.items, self.next_page_token)
    }
}

impl Page for InstanceAggregatedList {
    type Item = (String, InstancesScopedList);

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>) {
        if !self.unreachables.is_empty() {
            tracing::warn!("Unreachable scopes skipped: {}", self.unreachables.join(", "));
        }
        (self.items, self.next_page_token)
    }
}

/// Lazily paginated sequence
pub struct Pager<'a, P: Page> {
    client: &'a ComputeClient,
    url: String,
    query: Vec<(&'static str, String)>,
    buffer: VecDeque<P::Item>,
    next_page_token: Option<String>,
    pages_fetched: usize,
    exhausted: bool,
}

/// Instances of a single zone
pub type InstancePager<'a> = Pager<'a, InstanceList>;

/// `(zone key, instances)` groups across all zones
pub type AggregatedPager<'a> = Pager<'a, InstanceAggregatedList>;

impl<'a, P: Page> Pager<'a, P> {
    pub fn new(client: &'a ComputeClient, url: String, query: Vec<(&'static str, String)>) -> Self {
        Self {
            client,
            url,
            query,
            buffer: VecDeque::new(),
            next_page_token: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Next item, `Ok(None)` once every page has been consumed
    pub async fn next(&mut self) -> Result<Option<P::Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let mut query = self.query.clone();
        let sent_token = self.next_page_token.take();
        if let Some(token) = &sent_token {
            query.push(("pageToken", token.clone()));
        }

        let page: P = match self.client.get(&self.url, &query).await {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                // The first page failing is a plain request error; later pages abort a stream
                if self.pages_fetched == 0 {
                    return Err(e);
                }
                return Err(ComputeError::Iteration(Box::new(e)));
            }
        };
        self.pages_fetched += 1;

        let (items, next_page_token) = page.into_parts();
        tracing::debug!(
            "Fetched page {} with {} items (more: {})",
            self.pages_fetched,
            items.len(),
            next_page_token.is_some()
        );

        let next_page_token = next_page_token.filter(|t| !t.is_empty());
        if next_page_token.is_some() && next_page_token == sent_token {
            self.exhausted = true;
            return Err(ComputeError::Iteration(Box::new(ComputeError::Protocol(format!(
                "page token {:?} returned twice in a row",
                sent_token.unwrap_or_default()
            )))));
        }

        self.buffer.extend(items);
        self.next_page_token = next_page_token;
        self.exhausted = self.next_page_token.is_none();
        Ok(())
    }

    /// The same sequence as a `Stream`
    pub fn into_stream(self) -> impl Stream<Item = Result<P::Item>> + 'a
    where
        P: 'a,
        P::Item: 'a,
    {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, ComputeError>(pager.next().await?.map(|item| (item, pager)))
        })
    }
}
