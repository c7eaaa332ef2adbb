use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Path under which a stored source is exposed.
pub fn feed_source_link(id: Uuid) -> String {
    format!("/feeds/{}", id)
}

/// A tracked feed together with the items collected from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub link: String,
    pub feed_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub last_collected: Option<DateTime<Utc>>,
    #[serde(default, rename = "feedItems")]
    pub items: Vec<FeedItem>,
}

impl FeedSource {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            ..Default::default()
        }
    }

    pub fn partial(&self) -> FeedSourcePartial {
        FeedSourcePartial::from(self)
    }
}

/// Source details without the collected items, used for list views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSourcePartial {
    pub id: Option<Uuid>,
    pub link: String,
    pub feed_url: String,
    pub title: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    pub last_collected: Option<DateTime<Utc>>,
}

impl From<&FeedSource> for FeedSourcePartial {
    fn from(source: &FeedSource) -> Self {
        Self {
            id: source.id,
            link: source.id.map(feed_source_link).unwrap_or_default(),
            feed_url: source.feed_url.clone(),
            title: source.title.clone(),
            category_ids: source.category_ids.clone(),
            last_collected: source.last_collected,
        }
    }
}

impl FeedSourcePartial {
    pub fn into_source(self, items: Vec<FeedItem>) -> FeedSource {
        FeedSource {
            id: self.id,
            link: self.link,
            feed_url: self.feed_url,
            title: self.title,
            category_ids: self.category_ids,
            last_collected: self.last_collected,
            items,
        }
    }
}

/// An entry collected from a feed source.
///
/// `categories` holds the free-text labels supplied by the remote feed and is
/// display-only. `category_ids` is the relation to the category taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<FeedItemImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItemImage {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCategory {
    pub id: Option<Uuid>,
    pub name: String,
}

impl FeedCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Filter for item queries. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOptions {
    pub source_id: Option<Uuid>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

impl ItemOptions {
    pub fn for_source(source_id: Uuid) -> Self {
        Self {
            source_id: Some(source_id),
            category_ids: Vec::new(),
        }
    }

    pub fn for_category(category_id: Uuid) -> Self {
        Self {
            source_id: None,
            category_ids: vec![category_id],
        }
    }

    /// Category filtering is OR: one shared id is enough.
    pub fn matches(&self, item: &FeedItem) -> bool {
        if let Some(source_id) = self.source_id {
            if item.source_id != Some(source_id) {
                return false;
            }
        }
        self.category_ids.is_empty()
            || item
                .category_ids
                .iter()
                .any(|id| self.category_ids.contains(id))
    }
}

/// Orders items oldest first. Items without a published timestamp sort
/// before every dated item; equal keys keep their relative order.
pub fn sort_by_published(items: &mut [FeedItem]) {
    items.sort_by_key(|item| item.published);
}

/// Returns the entity id, generating one when the slot is empty.
/// The flag is true when a new id was assigned.
pub(crate) fn assign_id(slot: &mut Option<Uuid>) -> (Uuid, bool) {
    match *slot {
        Some(id) => (id, false),
        None => {
            let id = Uuid::new_v4();
            *slot = Some(id);
            (id, true)
        }
    }
}
