use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post as persisted in `blog-storage`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub title: String,
    /// Rich text (HTML) body.
    pub content: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author: String,
    pub author_id: String,
    pub date: DateTime<Utc>,
    pub views: u64,
    pub published: bool,
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author: String,
    pub author_id: String,
    pub date: DateTime<Utc>,
}

/// Input for a new post; id, date, counters and flags are assigned by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub image: Option<String>,
    pub author: String,
    pub author_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub author: String,
    pub author_id: String,
}

/// Shallow patch: every `Some` field overwrites the stored one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub views: Option<u64>,
    pub published: Option<bool>,
    pub likes: Option<u64>,
    pub comments: Option<Vec<Comment>>,
}

impl BlogPatch {
    pub(crate) fn apply(self, blog: &mut Blog) {
        if let Some(v) = self.title { blog.title = v; }
        if let Some(v) = self.content { blog.content = v; }
        if let Some(v) = self.excerpt { blog.excerpt = v; }
        if let Some(v) = self.image { blog.image = v; }
        if let Some(v) = self.author { blog.author = v; }
        if let Some(v) = self.author_id { blog.author_id = v; }
        if let Some(v) = self.views { blog.views = v; }
        if let Some(v) = self.published { blog.published = v; }
        if let Some(v) = self.likes { blog.likes = v; }
        if let Some(v) = self.comments { blog.comments = v; }
    }
}
