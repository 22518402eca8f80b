//! Schema definitions for the CRUD app.
//!
//! There is a single entity, [`Post`], stored in the `posts` table. The
//! `migrate` binary in this crate makes sure that table exists and has every
//! column and index declared here.

use chrono::{DateTime, Utc};
use postsync::{Column, Entity, Index, PgType, Schema, Table, TableDef};

/// A blog post.
///
/// `id` is assigned by the database (identity column) and never changes
/// afterwards; a post that hasn't been stored yet has id `0`. `created_at`
/// and `updated_at` are maintained by the mutators below. A post with
/// `deleted_at` set is soft-deleted: logically gone, physically still there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Primary key
    pub id: i64,

    /// When the post was created
    pub created_at: DateTime<Utc>,

    /// When the post was last changed
    pub updated_at: DateTime<Utc>,

    /// When the post was soft-deleted, if it was
    pub deleted_at: Option<DateTime<Utc>>,

    /// Post title
    pub title: String,

    /// Post content
    pub body: String,
}

impl Post {
    /// A new, unsaved post.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new_at(title, body, Utc::now())
    }

    fn new_at(title: impl Into<String>, body: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Replace the title and refresh `updated_at`.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Replace the body and refresh `updated_at`.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.touch();
    }

    /// Mark the post as deleted. A post that is already deleted keeps its
    /// original deletion time.
    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            let now = Utc::now();
            self.deleted_at = Some(now);
            self.updated_at = now.max(self.updated_at);
        }
    }

    /// Undo a soft delete.
    pub fn restore(&mut self) {
        if self.deleted_at.take().is_some() {
            self.touch();
        }
    }

    /// Whether the post is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    // Never moves updated_at backwards, even if the clock does.
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

impl Entity for Post {
    const TABLE: &'static str = "posts";

    fn table() -> Table {
        Table {
            name: Self::TABLE.to_string(),
            columns: vec![
                Column::identity_pk("id", PgType::BigInt),
                Column::new("created_at", PgType::Timestamptz).default("now()"),
                Column::new("updated_at", PgType::Timestamptz).default("now()"),
                Column::new("deleted_at", PgType::Timestamptz).nullable(),
                Column::new("title", PgType::Text).default("''"),
                Column::new("body", PgType::Text).default("''"),
            ],
            indices: vec![Index::on(Self::TABLE, &["deleted_at"])],
        }
    }
}

postsync::inventory::submit!(TableDef::new::<Post>());

/// The desired schema: every entity registered by this crate.
pub fn schema() -> Schema {
    Schema::collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use postsync::schema::create_table_sql;

    fn long_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_post() {
        let post = Post::new("Hello", "First post");
        assert_eq!(post.id, 0);
        assert_eq!(post.created_at, post.updated_at);
        assert!(!post.is_deleted());
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "First post");
    }

    #[test]
    fn test_updates_refresh_updated_at() {
        let mut post = Post::new_at("Hello", "First post", long_ago());

        post.set_title("Hello again");
        assert_eq!(post.title, "Hello again");
        assert_eq!(post.created_at, long_ago());
        assert!(post.updated_at > long_ago());

        let after_title = post.updated_at;
        post.set_body("Edited");
        assert_eq!(post.body, "Edited");
        assert!(post.updated_at >= after_title);
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let mut post = Post::new_at("Hello", "First post", long_ago());

        post.soft_delete();
        assert!(post.is_deleted());
        let deleted_at = post.deleted_at;

        // deleting twice keeps the first marker
        post.soft_delete();
        assert_eq!(post.deleted_at, deleted_at);

        post.restore();
        assert!(!post.is_deleted());
        assert_eq!(post.created_at, long_ago());
    }

    #[test]
    fn test_schema_has_posts_table() {
        let schema = schema();
        let posts = schema.get_table("posts").expect("posts is registered");

        let names: Vec<&str> = posts.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "created_at", "updated_at", "deleted_at", "title", "body"]
        );
        assert_eq!(posts.primary_key(), vec!["id"]);

        let deleted_at = posts.column("deleted_at").unwrap();
        assert!(deleted_at.nullable);

        assert_eq!(posts.indices.len(), 1);
        assert_eq!(posts.indices[0].name, "idx_posts_deleted_at");
        assert_eq!(posts.indices[0].columns, vec!["deleted_at"]);
        assert!(!posts.indices[0].unique);
    }

    #[test]
    fn snapshot_posts_table() {
        insta::assert_snapshot!(create_table_sql(&Post::table()), @r#"
CREATE TABLE "posts" (
    "id" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "deleted_at" TIMESTAMPTZ,
    "title" TEXT NOT NULL DEFAULT '',
    "body" TEXT NOT NULL DEFAULT ''
);
"#);
    }
}
