use chrono::{DateTime, Utc};
use std::fmt;
use validator::Validate;

pub const CATEGORY_FICTION: &str = "Fiction";
pub const CATEGORY_NON_FICTION: &str = "Non-Fiction";

/// Categories a post may be filed under
pub const CATEGORIES: [&str; 2] = [CATEGORY_FICTION, CATEGORY_NON_FICTION];

/// A stored author. `id` and the timestamps are assigned by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` until the record is first updated
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored blog post
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field values for a single author insert
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewAuthor {
    #[validate(length(min = 1, message = "Author cannot be empty."))]
    pub name: String,
    #[validate(custom(function = "crate::validation::validate_phone_number"))]
    pub phone_number: Option<String>,
}

/// Field values for a single post insert
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewPost {
    #[validate(custom(function = "crate::validation::validate_title"))]
    pub title: String,
    #[validate(length(min = 250, message = "Content must be at least 250 characters"))]
    pub content: String,
    #[validate(custom(function = "crate::validation::validate_category"))]
    pub category: String,
    #[validate(length(max = 250, message = "Post summary must be under 250 characters"))]
    pub summary: String,
}

/// Fields to change on an existing author. Only `Some` fields are validated and written.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct AuthorChanges {
    #[validate(length(min = 1, message = "Author cannot be empty."))]
    pub name: Option<String>,
    /// `Some(None)` clears the stored phone number
    #[validate(custom(function = "crate::validation::validate_phone_number"))]
    pub phone_number: Option<Option<String>>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none()
    }
}

/// Fields to change on an existing post
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PostChanges {
    #[validate(custom(function = "crate::validation::validate_title"))]
    pub title: Option<String>,
    #[validate(length(min = 250, message = "Content must be at least 250 characters"))]
    pub content: Option<String>,
    #[validate(custom(function = "crate::validation::validate_category"))]
    pub category: Option<String>,
    #[validate(length(max = 250, message = "Post summary must be under 250 characters"))]
    pub summary: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.summary.is_none()
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Author(id={}, name={})", self.id, self.name)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Post(id={}, title={} content={}, summary={})",
            self.id, self.title, self.content, self.summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_author() -> Author {
        Author {
            id: 7,
            name: "Ada Lovelace".to_string(),
            phone_number: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_author_display() {
        assert_eq!(sample_author().to_string(), "Author(id=7, name=Ada Lovelace)");
    }

    #[test]
    fn test_post_display() {
        let post = Post {
            id: 3,
            title: "Top 5".to_string(),
            content: "body".to_string(),
            category: CATEGORY_FICTION.to_string(),
            summary: "short".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        assert_eq!(
            post.to_string(),
            "Post(id=3, title=Top 5 content=body, summary=short)"
        );
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(AuthorChanges::default().is_empty());
        assert!(PostChanges::default().is_empty());

        let clear_phone = AuthorChanges {
            phone_number: Some(None),
            ..Default::default()
        };
        assert!(!clear_phone.is_empty());

        let new_title = PostChanges {
            title: Some("Secret".to_string()),
            ..Default::default()
        };
        assert!(!new_title.is_empty());
    }
}
