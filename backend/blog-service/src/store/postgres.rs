use super::{ContentStore, PostFilter};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, EditPost, Follow, Group, GroupRef, NewGroup, NewPost, Post, PostView,
    User,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.image, p.pub_date, p.author_id, u.username AS author,
           g.slug AS group_slug, g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

/// PostgreSQL content store (source of truth)
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    id: i64,
    text: String,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    author_id: Uuid,
    author: String,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let group = match (row.group_slug, row.group_title) {
            (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
            _ => None,
        };

        PostView {
            id: row.id,
            text: row.text,
            image: row.image,
            pub_date: row.pub_date,
            author_id: row.author_id,
            author: row.author,
            group,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    id: i64,
    text: String,
    created: DateTime<Utc>,
    author_id: Uuid,
    author: String,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        CommentView {
            id: row.id,
            text: row.text,
            created: row.created,
            author_id: row.author_id,
            author: row.author,
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(*group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(*author_id);
        }
        PostFilter::Authors(authors) => {
            qb.push(" WHERE p.author_id = ANY(")
                .push_bind(authors.clone())
                .push(")");
        }
    }
}

fn unique_violation(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{} already exists", what))
        }
        _ => err.into(),
    }
}

/// Foreign-key violations mean a referenced row is gone.
fn missing_reference(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound(what.to_string())
        }
        _ => err.into(),
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, username, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, &format!("user {}", username)))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (slug, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, slug, title, description
            "#,
        )
        .bind(&group.slug)
        .bind(&group.title)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, &format!("group {}", group.slug)))
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn create_post(&self, author_id: Uuid, post: &NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, group_id, text, image, pub_date)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, author_id, group_id, text, image, pub_date
            "#,
        )
        .bind(author_id)
        .bind(post.group_id)
        .bind(&post.text)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &format!("author {} or its group", author_id)))?;

        debug!(post_id = post.id, %author_id, "Created post in PostgreSQL");
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, edit: &EditPost) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING id, author_id, group_id, text, image, pub_date
            "#,
        )
        .bind(post_id)
        .bind(&edit.text)
        .bind(edit.group_id)
        .bind(&edit.image)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, group_id, text, image, pub_date
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post_view(&self, post_id: i64) -> Result<Option<PostView>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        qb.push(" WHERE p.id = ").push_bind(post_id);

        let row = qb
            .build_query_as::<PostViewRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostView::from))
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<usize> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);

        let (count,) = qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as usize)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostView>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let rows = qb
            .build_query_as::<PostViewRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }

    async fn create_comment(&self, post_id: i64, author_id: Uuid, text: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, text, created)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, post_id, author_id, text, created
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &format!("post {} or user {}", post_id, author_id)))?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT c.id, c.text, c.created, c.author_id, u.username AS author
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    async fn insert_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &format!("user {} or {}", user_id, author_id)))?;

        debug!(%user_id, %author_id, created = inserted.is_some(), "Follow insert in PostgreSQL");
        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_follows(&self, user_id: Uuid) -> Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, user_id, author_id, created_at
            FROM follows
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
