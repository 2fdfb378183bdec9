use {
    psytech_sessions::{DocumentKind, now_rfc3339},
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    tracing::debug,
};

use crate::{Result, Tracker, parse_timestamp};

/// Feed type used for bookmarked articles.
pub const BOOKMARK_FEED_TYPE: &str = "bookmark";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub user_id: String,
    /// e.g. `article`, `tip`, or [`BOOKMARK_FEED_TYPE`].
    pub feed_type: String,
    #[serde(default)]
    pub content: Value,
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub bookmarked_at: String,
}

impl Bookmark {
    fn from_item(item: FeedItem) -> Option<Self> {
        let url = item.content.get("url")?.as_str()?.to_string();
        let text = |field: &str| item.content.get(field).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            title: text("title").unwrap_or_default(),
            summary: text("summary"),
            url,
            bookmarked_at: item.created_at,
        })
    }
}

impl Tracker<'_> {
    /// Append an unread feed item.
    pub fn save_feed_item(&self, user_id: &str, feed_type: &str, content: Value) -> Result<usize> {
        let item = FeedItem {
            user_id: user_id.to_string(),
            feed_type: feed_type.to_string(),
            content,
            created_at: now_rfc3339(),
            read: false,
        };
        self.push(DocumentKind::Feed, &item)
    }

    /// The user's feed, newest first, at most `limit` items.
    ///
    /// Without a `feed_type` filter, bookmarks are left out; ask for
    /// [`BOOKMARK_FEED_TYPE`] or use [`Tracker::bookmarks`] to get them.
    pub fn feed_items(
        &self,
        user_id: &str,
        feed_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FeedItem>> {
        let mut items: Vec<FeedItem> = self.records(DocumentKind::Feed)?;
        items.retain(|item| {
            item.user_id == user_id
                && match feed_type {
                    Some(wanted) => item.feed_type == wanted,
                    None => item.feed_type != BOOKMARK_FEED_TYPE,
                }
        });
        items.sort_by_key(|item| std::cmp::Reverse(parse_timestamp(&item.created_at)));
        items.truncate(limit);
        Ok(items)
    }

    /// Bookmark an article. Bookmarking a url twice is a no-op.
    ///
    /// Returns `false` if the url was already bookmarked.
    pub fn bookmark_article(
        &self,
        user_id: &str,
        title: &str,
        url: &str,
        summary: Option<&str>,
    ) -> Result<bool> {
        if self.bookmarks(user_id)?.iter().any(|b| b.url == url) {
            debug!(session_id = self.session_id, url, "already bookmarked");
            return Ok(false);
        }
        self.save_feed_item(
            user_id,
            BOOKMARK_FEED_TYPE,
            json!({"title": title, "url": url, "summary": summary}),
        )?;
        Ok(true)
    }

    /// Bookmarked articles, newest first.
    pub fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        Ok(self
            .feed_items(user_id, Some(BOOKMARK_FEED_TYPE), usize::MAX)?
            .into_iter()
            .filter_map(Bookmark::from_item)
            .collect())
    }
}
