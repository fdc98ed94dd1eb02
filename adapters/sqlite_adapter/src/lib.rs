use blog_core::domain::{Author, AuthorChanges, NewAuthor, NewPost, Post, PostChanges};
use blog_core::ports::{AuthorRepository, BlogError, PostRepository, Result};
use blog_core::validation::{
    field_error, name_taken, rule_error, MSG_CATEGORY, MSG_CONTENT_LENGTH, MSG_SUMMARY_LENGTH,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::ToSql;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use validator::ValidationErrors;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    phone_number TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT
);

CREATE TABLE IF NOT EXISTS posts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    category   TEXT NOT NULL,
    summary    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    CONSTRAINT posts_category_valid CHECK (category IN ('Fiction', 'Non-Fiction')),
    CONSTRAINT posts_content_length CHECK (length(content) >= 250),
    CONSTRAINT posts_summary_length CHECK (length(summary) <= 250)
);
"#;

const AUTHOR_COLUMNS: &str = "id, name, phone_number, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, content, category, summary, created_at, updated_at";

/// SQLite implementation of the author and post repositories
pub struct SqliteBlogRepository {
    conn: Connection,
}

impl SqliteBlogRepository {
    /// Opens (or creates) the database file at `db_path` and ensures the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path).map_err(map_error)?;
        info!("Opened blog database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(map_error)?;
        debug!("Blog schema ready");
        Ok(Self { conn })
    }

    fn query_author(&self, sql: &str, param: &dyn ToSql) -> Result<Option<Author>> {
        self.conn
            .query_row(sql, [param], author_from_row)
            .optional()
            .map_err(map_error)
    }
}

impl AuthorRepository for SqliteBlogRepository {
    fn find_author(&self, id: i64) -> Result<Option<Author>> {
        let sql = format!("SELECT {} FROM authors WHERE id = ?1", AUTHOR_COLUMNS);
        self.query_author(&sql, &id)
    }

    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>> {
        let sql = format!("SELECT {} FROM authors WHERE name = ?1", AUTHOR_COLUMNS);
        self.query_author(&sql, &name)
    }

    fn list_authors(&self) -> Result<Vec<Author>> {
        let sql = format!("SELECT {} FROM authors ORDER BY id ASC", AUTHOR_COLUMNS);
        let mut stmt = self.conn.prepare(&sql).map_err(map_error)?;

        let authors = stmt
            .query_map([], author_from_row)
            .map_err(map_error)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .map_err(map_error)?;

        Ok(authors)
    }

    fn insert_author(&self, author: &NewAuthor) -> Result<Author> {
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO authors (name, phone_number, created_at) VALUES (?1, ?2, ?3)",
                params![author.name, author.phone_number, created_at],
            )
            .map_err(map_error)?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted author row {}", id);
        Ok(Author {
            id,
            name: author.name.clone(),
            phone_number: author.phone_number.clone(),
            created_at,
            updated_at: None,
        })
    }

    fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Author> {
        let mut update = UpdateBuilder::new("authors");
        if let Some(name) = &changes.name {
            update.set("name", name);
        }
        if let Some(phone_number) = &changes.phone_number {
            update.set("phone_number", phone_number);
        }

        let tx = self.conn.unchecked_transaction().map_err(map_error)?;
        if !update.execute(&tx, id)? {
            return Err(BlogError::AuthorNotFound(id));
        }
        let sql = format!("SELECT {} FROM authors WHERE id = ?1", AUTHOR_COLUMNS);
        let author = tx
            .query_row(&sql, [id], author_from_row)
            .map_err(map_error)?;
        tx.commit().map_err(map_error)?;
        Ok(author)
    }

    fn delete_author(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1", [id])
            .map_err(map_error)?;
        Ok(deleted > 0)
    }
}

impl PostRepository for SqliteBlogRepository {
    fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
        self.conn
            .query_row(&sql, [id], post_from_row)
            .optional()
            .map_err(map_error)
    }

    fn list_posts(&self) -> Result<Vec<Post>> {
        let sql = format!("SELECT {} FROM posts ORDER BY id ASC", POST_COLUMNS);
        let mut stmt = self.conn.prepare(&sql).map_err(map_error)?;

        let posts = stmt
            .query_map([], post_from_row)
            .map_err(map_error)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .map_err(map_error)?;

        Ok(posts)
    }

    fn insert_post(&self, post: &NewPost) -> Result<Post> {
        let created_at = Utc::now();
        self.conn
            .execute(
                r#"
                INSERT INTO posts (title, content, category, summary, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![post.title, post.content, post.category, post.summary, created_at],
            )
            .map_err(map_error)?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted post row {}", id);
        Ok(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            summary: post.summary.clone(),
            created_at,
            updated_at: None,
        })
    }

    fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post> {
        let mut update = UpdateBuilder::new("posts");
        if let Some(title) = &changes.title {
            update.set("title", title);
        }
        if let Some(content) = &changes.content {
            update.set("content", content);
        }
        if let Some(category) = &changes.category {
            update.set("category", category);
        }
        if let Some(summary) = &changes.summary {
            update.set("summary", summary);
        }

        let tx = self.conn.unchecked_transaction().map_err(map_error)?;
        if !update.execute(&tx, id)? {
            return Err(BlogError::PostNotFound(id));
        }
        let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
        let post = tx.query_row(&sql, [id], post_from_row).map_err(map_error)?;
        tx.commit().map_err(map_error)?;
        Ok(post)
    }

    fn delete_post(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", [id])
            .map_err(map_error)?;
        Ok(deleted > 0)
    }
}

/// Collects the changed columns of one row into a single UPDATE statement,
/// stamping `updated_at` alongside them
struct UpdateBuilder<'a> {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<&'a dyn ToSql>,
}

impl<'a> UpdateBuilder<'a> {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    fn set(&mut self, column: &'static str, value: &'a dyn ToSql) {
        self.columns.push(column);
        self.values.push(value);
    }

    /// Returns false when no row has `id`
    fn execute(self, conn: &Connection, id: i64) -> Result<bool> {
        let updated_at = Utc::now();
        let mut assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let next = self.columns.len() + 1;
        assignments.push(format!("updated_at = ?{}", next));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table,
            assignments.join(", "),
            next + 1
        );

        let mut values: Vec<&dyn ToSql> = self.values;
        values.push(&updated_at);
        values.push(&id);

        let changed = conn.execute(&sql, values.as_slice()).map_err(map_error)?;
        debug!("Updated {} row {} ({} columns)", self.table, id, self.columns.len());
        Ok(changed > 0)
    }
}

fn author_from_row(row: &Row) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        phone_number: row.get(2)?,
        created_at: row.get::<_, DateTime<Utc>>(3)?,
        updated_at: row.get::<_, Option<DateTime<Utc>>>(4)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        summary: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Translates SQLite constraint failures into the validation error the
/// application rule for the same field reports. Anything else is a storage error.
fn map_error(err: rusqlite::Error) -> BlogError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        let violation = match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE if message.contains("authors.name") => {
                Some(field_error("name", name_taken()))
            }
            ffi::SQLITE_CONSTRAINT_CHECK => check_violation(message),
            _ => None,
        };
        if let Some(errors) = violation {
            debug!("Storage constraint rejected write: {}", message);
            return BlogError::Validation(errors);
        }
    }
    BlogError::Storage(err.to_string())
}

fn check_violation(message: &str) -> Option<ValidationErrors> {
    let errors = if message.contains("posts_category_valid") {
        field_error("category", rule_error("category", MSG_CATEGORY))
    } else if message.contains("posts_content_length") {
        field_error("content", rule_error("length", MSG_CONTENT_LENGTH))
    } else if message.contains("posts_summary_length") {
        field_error("summary", rule_error("length", MSG_SUMMARY_LENGTH))
    } else {
        return None;
    };
    Some(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::application::{AuthorService, PostService};
    use blog_core::validation::{field_messages, MSG_NAME_TAKEN};

    fn new_post() -> NewPost {
        NewPost {
            title: "The Secret Life of Crates".to_string(),
            content: "c".repeat(260),
            category: "Fiction".to_string(),
            summary: "Crates, secretly".to_string(),
        }
    }

    fn field_of(err: BlogError) -> String {
        match err {
            BlogError::Validation(errors) => {
                let messages = field_messages(&errors);
                assert_eq!(messages.len(), 1, "expected one failed rule: {:?}", messages);
                messages[0].0.clone()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_and_find_author() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let created = repo
            .insert_author(&NewAuthor {
                name: "Ada".to_string(),
                phone_number: Some("5551234567".to_string()),
            })
            .unwrap();

        let found = repo.find_author(created.id).unwrap().unwrap();
        assert_eq!(found.name, "Ada");
        assert_eq!(found.phone_number.as_deref(), Some("5551234567"));
        assert_eq!(found.created_at, created.created_at);
        assert!(found.updated_at.is_none());

        let by_name = repo.find_author_by_name("Ada").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(repo.find_author_by_name("ada").unwrap().is_none());
    }

    #[test]
    fn test_unique_name_constraint_maps_to_validation_error() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let author = NewAuthor {
            name: "Ada".to_string(),
            phone_number: None,
        };
        repo.insert_author(&author).unwrap();

        let err = repo.insert_author(&author).unwrap_err();
        assert_eq!(field_of(err), "name");
        assert_eq!(repo.list_authors().unwrap().len(), 1);
    }

    #[test]
    fn test_unique_name_constraint_on_rename() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        for name in ["Ada", "Grace"] {
            repo.insert_author(&NewAuthor {
                name: name.to_string(),
                phone_number: None,
            })
            .unwrap();
        }
        let grace = repo.find_author_by_name("Grace").unwrap().unwrap();

        let err = repo
            .update_author(
                grace.id,
                &AuthorChanges {
                    name: Some("Ada".to_string()),
                    phone_number: Some(Some("5551234567".to_string())),
                },
            )
            .unwrap_err();
        match err {
            BlogError::Validation(errors) => assert_eq!(
                field_messages(&errors),
                vec![("name".to_string(), MSG_NAME_TAKEN.to_string())]
            ),
            other => panic!("expected validation error, got {:?}", other),
        }

        let stored = repo.find_author(grace.id).unwrap().unwrap();
        assert_eq!(stored.name, "Grace");
        assert!(stored.phone_number.is_none());
        assert!(stored.updated_at.is_none());
    }

    #[test]
    fn test_check_constraints_map_to_validation_errors() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();

        let mut post = new_post();
        post.category = "Poetry".to_string();
        assert_eq!(field_of(repo.insert_post(&post).unwrap_err()), "category");

        let mut post = new_post();
        post.content = "c".repeat(249);
        assert_eq!(field_of(repo.insert_post(&post).unwrap_err()), "content");

        let mut post = new_post();
        post.summary = "s".repeat(251);
        assert_eq!(field_of(repo.insert_post(&post).unwrap_err()), "summary");

        assert!(repo.list_posts().unwrap().is_empty());
    }

    #[test]
    fn test_update_post_is_all_or_nothing() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let post = repo.insert_post(&new_post()).unwrap();

        let err = repo
            .update_post(
                post.id,
                &PostChanges {
                    title: Some("Guess Again".to_string()),
                    content: Some("too short".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(field_of(err), "content");

        let stored = repo.find_post(post.id).unwrap().unwrap();
        assert_eq!(stored.title, post.title);
        assert!(stored.updated_at.is_none());
    }

    #[test]
    fn test_update_sets_updated_at_and_keeps_created_at() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let post = repo.insert_post(&new_post()).unwrap();

        let updated = repo
            .update_post(
                post.id,
                &PostChanges {
                    summary: Some("New summary".to_string()),
                    category: Some("Non-Fiction".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.summary, "New summary");
        assert_eq!(updated.category, "Non-Fiction");
        assert_eq!(updated.title, post.title);
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_author_clears_phone_number() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let author = repo
            .insert_author(&NewAuthor {
                name: "Ada".to_string(),
                phone_number: Some("5551234567".to_string()),
            })
            .unwrap();

        let updated = repo
            .update_author(
                author.id,
                &AuthorChanges {
                    phone_number: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.phone_number.is_none());
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_missing_rows() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let changes = AuthorChanges {
            name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_author(5, &changes),
            Err(BlogError::AuthorNotFound(5))
        ));
        let changes = PostChanges {
            title: Some("Top 3".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_post(5, &changes),
            Err(BlogError::PostNotFound(5))
        ));
    }

    #[test]
    fn test_delete_is_unconstrained() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let post = repo.insert_post(&new_post()).unwrap();
        assert!(repo.delete_post(post.id).unwrap());
        assert!(!repo.delete_post(post.id).unwrap());
        assert!(repo.find_post(post.id).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let repo = SqliteBlogRepository::open_in_memory().unwrap();
        let first = repo.insert_post(&new_post()).unwrap();
        repo.delete_post(first.id).unwrap();
        let second = repo.insert_post(&new_post()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_services_over_sqlite() {
        let authors = AuthorService::new(Box::new(SqliteBlogRepository::open_in_memory().unwrap()));
        authors
            .create_author(&NewAuthor {
                name: "Ada".to_string(),
                phone_number: None,
            })
            .unwrap();
        let err = authors
            .create_author(&NewAuthor {
                name: "Ada".to_string(),
                phone_number: None,
            })
            .unwrap_err();
        assert_eq!(field_of(err), "name");

        let posts = PostService::new(Box::new(SqliteBlogRepository::open_in_memory().unwrap()));
        let post = posts.create_post(&new_post()).unwrap();
        assert_eq!(posts.get_post(post.id).unwrap().title, post.title);
    }

    #[test]
    fn test_data_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");

        let id = {
            let repo = SqliteBlogRepository::open(&path).unwrap();
            repo.insert_author(&NewAuthor {
                name: "Grace".to_string(),
                phone_number: None,
            })
            .unwrap()
            .id
        };

        let repo = SqliteBlogRepository::open(&path).unwrap();
        let author = repo.find_author(id).unwrap().unwrap();
        assert_eq!(author.name, "Grace");
    }
}
