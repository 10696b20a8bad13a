//! Blog posts, their comments, and per-user post bookmarks.

pub mod domain;
pub mod store;

pub use domain::{Blog, BlogPatch, Comment, NewBlog, NewComment};
pub use store::BlogStore;
