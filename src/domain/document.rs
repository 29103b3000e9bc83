use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel-level metadata of a fetched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}

/// A parsed feed. Items keep the order they had in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub channel: Channel,
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(FeedItem::display_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_with_title() {
        let item = FeedItem {
            title: Some("My Article".into()),
            ..Default::default()
        };
        assert_eq!(item.display_title(), "My Article");
    }

    #[test]
    fn test_display_title_without_title() {
        let item = FeedItem::default();
        assert_eq!(item.display_title(), "(Untitled)");
    }

    #[test]
    fn test_titles_keep_document_order() {
        let doc = FeedDocument {
            channel: Channel::default(),
            items: vec![
                FeedItem {
                    title: Some("first".into()),
                    ..Default::default()
                },
                FeedItem::default(),
                FeedItem {
                    title: Some("third".into()),
                    ..Default::default()
                },
            ],
        };
        let titles: Vec<&str> = doc.titles().collect();
        assert_eq!(titles, vec!["first", "(Untitled)", "third"]);
    }
}
