use crate::domain::{Author, AuthorChanges, NewAuthor, NewPost, Post, PostChanges};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum BlogError {
    /// A field rule failed, either in the application or as a storage constraint
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("Author {0} not found")]
    AuthorNotFound(i64),
    #[error("Post {0} not found")]
    PostNotFound(i64),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, BlogError>;

/// Storage for authors. Implementations assign ids and timestamps, and apply
/// each insert or update atomically.
pub trait AuthorRepository {
    fn find_author(&self, id: i64) -> Result<Option<Author>>;

    // Exact, case-sensitive match
    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>>;

    fn list_authors(&self) -> Result<Vec<Author>>;

    fn insert_author(&self, author: &NewAuthor) -> Result<Author>;

    /// Fails with `AuthorNotFound` when no author has `id`
    fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Author>;

    /// Returns false when nothing was deleted
    fn delete_author(&self, id: i64) -> Result<bool>;
}

/// Storage for posts
pub trait PostRepository {
    fn find_post(&self, id: i64) -> Result<Option<Post>>;

    fn list_posts(&self) -> Result<Vec<Post>>;

    fn insert_post(&self, post: &NewPost) -> Result<Post>;

    fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post>;

    fn delete_post(&self, id: i64) -> Result<bool>;
}
