use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Blog, BlogPatch, Comment, NewBlog, NewComment};
use crate::errors::ServiceError;
use crate::ids::next_id;
use crate::storage::{keys, LocalStorage, PersistedState};

/// Persisted shape of `blog-storage`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlogState {
    #[serde(default)]
    pub blogs: Vec<Blog>,
    /// Flat `"<user>-<post>"` bookmark keys.
    #[serde(default)]
    pub bookmarks: Vec<String>,
}

fn bookmark_key(user_id: &str, blog_id: &str) -> String {
    format!("{user_id}-{blog_id}")
}

/// Blog posts plus the user x post bookmark relation.
///
/// Nothing here validates input; lookups of unknown ids yield `None` and
/// mutations of unknown ids report `false` without touching the state.
pub struct BlogStore {
    state: PersistedState<BlogState>,
}

impl BlogStore {
    pub async fn open(storage: LocalStorage) -> Result<Arc<Self>, ServiceError> {
        let state = PersistedState::open(storage, keys::BLOG).await?;
        Ok(Arc::new(Self { state }))
    }

    /// Store a new unpublished post and return its id.
    pub async fn add_blog(&self, input: NewBlog) -> Result<String, ServiceError> {
        let blog = Blog {
            id: next_id(),
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            image: input.image,
            author: input.author,
            author_id: input.author_id,
            date: Utc::now(),
            views: 0,
            published: false,
            likes: 0,
            comments: Vec::new(),
        };
        let id = blog.id.clone();
        self.state.update(|s| s.blogs.push(blog)).await?;
        Ok(id)
    }

    pub async fn publish_blog(&self, id: &str) -> Result<bool, ServiceError> {
        let found = self.modify(id, |b| b.published = true).await?;
        if found {
            info!(blog_id = %id, "blog published");
        }
        Ok(found)
    }

    pub async fn get_blog(&self, id: &str) -> Option<Blog> {
        self.state.read(|s| s.blogs.iter().find(|b| b.id == id).cloned()).await
    }

    /// Every post, in insertion order.
    pub async fn blogs(&self) -> Vec<Blog> {
        self.state.read(|s| s.blogs.clone()).await
    }

    pub async fn user_blogs(&self, author_id: &str) -> Vec<Blog> {
        self.filter(|b| b.author_id == author_id).await
    }

    pub async fn published_blogs(&self) -> Vec<Blog> {
        self.filter(|b| b.published).await
    }

    pub async fn unpublished_blogs(&self) -> Vec<Blog> {
        self.filter(|b| !b.published).await
    }

    /// One more like. There is no per-user like record, so repeats all count.
    pub async fn like_blog(&self, id: &str) -> Result<bool, ServiceError> {
        self.modify(id, |b| b.likes = b.likes.saturating_add(1)).await
    }

    /// Counters saturate at `u64::MAX`.
    pub async fn record_view(&self, id: &str) -> Result<bool, ServiceError> {
        self.modify(id, |b| b.views = b.views.saturating_add(1)).await
    }

    /// Append a comment; `None` when the post does not exist.
    pub async fn add_comment(&self, id: &str, input: NewComment) -> Result<Option<Comment>, ServiceError> {
        let comment = Comment {
            id: next_id(),
            content: input.content,
            author: input.author,
            author_id: input.author_id,
            date: Utc::now(),
        };
        let added = self
            .state
            .update(|s| {
                let blog = s.blogs.iter_mut().find(|b| b.id == id)?;
                blog.comments.push(comment.clone());
                Some(comment)
            })
            .await?;
        Ok(added)
    }

    /// Flip the bookmark for `(user, blog)`; returns the new state.
    pub async fn toggle_bookmark(&self, blog_id: &str, user_id: &str) -> Result<bool, ServiceError> {
        let key = bookmark_key(user_id, blog_id);
        let now_bookmarked = self
            .state
            .update(|s| {
                if let Some(pos) = s.bookmarks.iter().position(|b| *b == key) {
                    s.bookmarks.remove(pos);
                    false
                } else {
                    s.bookmarks.push(key);
                    true
                }
            })
            .await?;
        Ok(now_bookmarked)
    }

    pub async fn is_bookmarked(&self, blog_id: &str, user_id: &str) -> bool {
        let key = bookmark_key(user_id, blog_id);
        self.state.read(|s| s.bookmarks.contains(&key)).await
    }

    pub async fn bookmarked_blogs(&self, user_id: &str) -> Vec<Blog> {
        self.state
            .read(|s| {
                s.blogs
                    .iter()
                    .filter(|b| s.bookmarks.contains(&bookmark_key(user_id, &b.id)))
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Remove a post and every bookmark whose key ends in `-<id>`.
    pub async fn delete_blog(&self, id: &str) -> Result<bool, ServiceError> {
        let suffix = format!("-{id}");
        let existed = self
            .state
            .update(|s| {
                let before = s.blogs.len();
                s.blogs.retain(|b| b.id != id);
                s.bookmarks.retain(|b| !b.ends_with(&suffix));
                s.blogs.len() != before
            })
            .await?;
        if existed {
            info!(blog_id = %id, "blog deleted");
        }
        Ok(existed)
    }

    pub async fn update_blog(&self, id: &str, patch: BlogPatch) -> Result<bool, ServiceError> {
        self.modify(id, move |b| patch.apply(b)).await
    }

    async fn filter(&self, pred: impl Fn(&Blog) -> bool) -> Vec<Blog> {
        self.state.read(|s| s.blogs.iter().filter(|b| pred(*b)).cloned().collect()).await
    }

    async fn modify(&self, id: &str, f: impl FnOnce(&mut Blog)) -> Result<bool, ServiceError> {
        let found = self
            .state
            .update(|s| match s.blogs.iter_mut().find(|b| b.id == id) {
                Some(blog) => {
                    f(blog);
                    true
                }
                None => false,
            })
            .await?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> (Arc<BlogStore>, LocalStorage) {
        let dir = std::env::temp_dir().join(format!("blog_store_{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir).await.expect("storage init");
        (BlogStore::open(storage.clone()).await.expect("store init"), storage)
    }

    fn draft(author_id: &str, title: &str) -> NewBlog {
        NewBlog {
            title: title.into(),
            content: "<p>Hello</p>".into(),
            excerpt: "Hello...".into(),
            image: None,
            author: "Ada".into(),
            author_id: author_id.into(),
        }
    }

    #[tokio::test]
    async fn counters_saturate_at_max() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let id = store.add_blog(draft("u1", "Popular")).await?;
        let patch = BlogPatch { likes: Some(u64::MAX), views: Some(u64::MAX), ..Default::default() };
        assert!(store.update_blog(&id, patch).await?);

        assert!(store.like_blog(&id).await?);
        assert!(store.record_view(&id).await?);
        let blog = store.get_blog(&id).await.expect("found");
        assert_eq!((blog.likes, blog.views), (u64::MAX, u64::MAX));

        let reopened = BlogStore::open(storage.clone()).await?;
        assert_eq!(reopened.get_blog(&id).await.expect("found").likes, u64::MAX);

        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn add_then_publish_moves_between_views() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let id = store.add_blog(draft("u1", "First")).await?;

        let created = store.get_blog(&id).await.expect("found");
        assert!(!created.published);
        assert_eq!((created.views, created.likes), (0, 0));
        assert!(created.comments.is_empty());
        assert!(store.unpublished_blogs().await.iter().any(|b| b.id == id));
        assert!(store.published_blogs().await.is_empty());

        assert!(store.publish_blog(&id).await?);
        assert!(store.published_blogs().await.iter().any(|b| b.id == id));
        assert!(store.unpublished_blogs().await.iter().all(|b| b.id != id));

        assert!(!store.publish_blog("nope").await?);
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn likes_are_not_deduplicated() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let id = store.add_blog(draft("u1", "Liked")).await?;
        for _ in 0..7 {
            assert!(store.like_blog(&id).await?);
        }
        store.record_view(&id).await?;
        let blog = store.get_blog(&id).await.unwrap();
        assert_eq!(blog.likes, 7);
        assert_eq!(blog.views, 1);
        assert!(!store.like_blog("missing").await?);
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn toggling_bookmark_twice_restores_state() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let id = store.add_blog(draft("u1", "Mark me")).await?;

        assert!(!store.is_bookmarked(&id, "reader").await);
        assert!(store.toggle_bookmark(&id, "reader").await?);
        assert!(store.is_bookmarked(&id, "reader").await);
        assert_eq!(store.bookmarked_blogs("reader").await.len(), 1);
        assert!(!store.toggle_bookmark(&id, "reader").await?);
        assert!(!store.is_bookmarked(&id, "reader").await);
        assert!(store.bookmarked_blogs("reader").await.is_empty());
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_prunes_bookmarks_of_every_user() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let doomed = store.add_blog(draft("u1", "Doomed")).await?;
        let kept = store.add_blog(draft("u1", "Kept")).await?;
        store.toggle_bookmark(&doomed, "alice").await?;
        store.toggle_bookmark(&doomed, "bob").await?;
        store.toggle_bookmark(&kept, "alice").await?;

        assert!(store.delete_blog(&doomed).await?);
        assert!(store.get_blog(&doomed).await.is_none());
        assert!(!store.is_bookmarked(&doomed, "alice").await);
        assert!(!store.is_bookmarked(&doomed, "bob").await);
        assert!(store.is_bookmarked(&kept, "alice").await);
        let remaining = store.state.read(|s| s.bookmarks.clone()).await;
        assert_eq!(remaining, vec![format!("alice-{kept}")]);

        assert!(!store.delete_blog(&doomed).await?);
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn comments_update_and_author_listing() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let mine = store.add_blog(draft("u1", "Mine")).await?;
        store.add_blog(draft("u2", "Theirs")).await?;

        let c = store
            .add_comment(&mine, NewComment { content: "Nice".into(), author: "Bo".into(), author_id: "u2".into() })
            .await?
            .expect("comment added");
        assert_eq!(c.author_id, "u2");
        assert!(store
            .add_comment("ghost", NewComment { content: "?".into(), author: "Bo".into(), author_id: "u2".into() })
            .await?
            .is_none());

        let patch = BlogPatch { title: Some("Renamed".into()), image: Some(Some("data:image/png;base64,AA".into())), ..Default::default() };
        assert!(store.update_blog(&mine, patch).await?);
        let blog = store.get_blog(&mine).await.unwrap();
        assert_eq!(blog.title, "Renamed");
        assert_eq!(blog.content, "<p>Hello</p>");
        assert_eq!(blog.comments.len(), 1);
        assert!(blog.image.is_some());

        let by_u1 = store.user_blogs("u1").await;
        assert_eq!(by_u1.len(), 1);
        assert_eq!(by_u1[0].id, mine);
        assert_eq!(store.blogs().await.len(), 2);
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn state_survives_reopen() -> Result<(), anyhow::Error> {
        let (store, storage) = setup_store().await;
        let id = store.add_blog(draft("u1", "Durable")).await?;
        store.publish_blog(&id).await?;
        store.toggle_bookmark(&id, "u9").await?;
        drop(store);

        let reopened = BlogStore::open(storage.clone()).await?;
        assert!(reopened.get_blog(&id).await.unwrap().published);
        assert!(reopened.is_bookmarked(&id, "u9").await);

        let raw: serde_json::Value = storage.get_json(keys::BLOG).await?.unwrap();
        assert_eq!(raw["state"]["blogs"][0]["authorId"], "u1");
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }
}
