use crate::domain::{Author, AuthorChanges, NewAuthor, NewPost, Post, PostChanges};
use crate::ports::{AuthorRepository, BlogError, PostRepository, Result};
use crate::validation::name_taken;
use log::{debug, warn};
use validator::{Validate, ValidationErrors};

/// Application service for writing and reading authors
pub struct AuthorService {
    repository: Box<dyn AuthorRepository>,
}

impl AuthorService {
    /// Creates a new AuthorService backed by the given repository
    pub fn new(repository: Box<dyn AuthorRepository>) -> Self {
        Self { repository }
    }

    /// Validates every field, checks the name is free, then inserts.
    /// Nothing is stored when any check fails.
    pub fn create_author(&self, author: &NewAuthor) -> Result<Author> {
        let mut errors = collect(author.validate());
        if !author.name.is_empty() && self.name_taken(&author.name, None)? {
            errors.add("name", name_taken());
        }
        reject_if_any("author", errors)?;

        let created = self.repository.insert_author(author)?;
        debug!("Created {}", created);
        Ok(created)
    }

    /// Applies the supplied fields to an existing author after validating them
    pub fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Author> {
        let current = self.get_author(id)?;
        if changes.is_empty() {
            return Ok(current);
        }

        let mut errors = collect(changes.validate());
        if let Some(name) = changes.name.as_deref().filter(|n| !n.is_empty()) {
            if self.name_taken(name, Some(id))? {
                errors.add("name", name_taken());
            }
        }
        reject_if_any("author", errors)?;

        let updated = self.repository.update_author(id, changes)?;
        debug!("Updated {}", updated);
        Ok(updated)
    }

    pub fn get_author(&self, id: i64) -> Result<Author> {
        self.repository
            .find_author(id)?
            .ok_or(BlogError::AuthorNotFound(id))
    }

    pub fn list_authors(&self) -> Result<Vec<Author>> {
        self.repository.list_authors()
    }

    pub fn delete_author(&self, id: i64) -> Result<()> {
        if !self.repository.delete_author(id)? {
            return Err(BlogError::AuthorNotFound(id));
        }
        debug!("Deleted author {}", id);
        Ok(())
    }

    /// Looks for another stored author holding `name`. The record being
    /// written is skipped by id; a record without an id never is.
    fn name_taken(&self, name: &str, own_id: Option<i64>) -> Result<bool> {
        let taken = match self.repository.find_author_by_name(name)? {
            Some(existing) => Some(existing.id) != own_id,
            None => false,
        };
        Ok(taken)
    }
}

/// Application service for writing and reading posts
pub struct PostService {
    repository: Box<dyn PostRepository>,
}

impl PostService {
    pub fn new(repository: Box<dyn PostRepository>) -> Self {
        Self { repository }
    }

    pub fn create_post(&self, post: &NewPost) -> Result<Post> {
        reject_if_any("post", collect(post.validate()))?;

        let created = self.repository.insert_post(post)?;
        debug!("Created post {}", created.id);
        Ok(created)
    }

    pub fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post> {
        let current = self.get_post(id)?;
        if changes.is_empty() {
            return Ok(current);
        }

        reject_if_any("post", collect(changes.validate()))?;

        let updated = self.repository.update_post(id, changes)?;
        debug!("Updated post {}", updated.id);
        Ok(updated)
    }

    pub fn get_post(&self, id: i64) -> Result<Post> {
        self.repository
            .find_post(id)?
            .ok_or(BlogError::PostNotFound(id))
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        self.repository.list_posts()
    }

    pub fn delete_post(&self, id: i64) -> Result<()> {
        if !self.repository.delete_post(id)? {
            return Err(BlogError::PostNotFound(id));
        }
        debug!("Deleted post {}", id);
        Ok(())
    }
}

fn collect(outcome: std::result::Result<(), ValidationErrors>) -> ValidationErrors {
    outcome.err().unwrap_or_else(ValidationErrors::new)
}

fn reject_if_any(record: &str, errors: ValidationErrors) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    warn!("Rejected {} write: {}", record, errors);
    Err(BlogError::Validation(errors))
}
