use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{GatorError, Result};
use crate::domain::{Channel, FeedDocument, FeedItem};

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS, Atom or JSON Feed body into a [`FeedDocument`].
    pub fn normalize(&self, body: &[u8]) -> Result<FeedDocument> {
        let feed = parser::parse(body).map_err(|e| GatorError::Parse(e.to_string()))?;

        let channel = Channel {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            link: feed.links.first().map(|l| l.href.clone()),
            description: feed
                .description
                .map(|d| decode_html_entities(&d.content).to_string()),
        };

        let items = feed.entries.into_iter().map(Self::item_from_entry).collect();

        Ok(FeedDocument { channel, items })
    }

    fn item_from_entry(entry: Entry) -> FeedItem {
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        FeedItem {
            title: entry.title.map(|t| decode_html_entities(&t.content).to_string()),
            link: entry.links.first().map(|l| l.href.clone()),
            description: description.map(|d| decode_html_entities(&d).to_string()),
            published_at: entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
