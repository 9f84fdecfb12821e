//! Community forum: threads in four categories, replies, and attachment
//! metadata. Attachment files live in object storage; rows keep their keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::forum::{ForumAttachmentRow, ForumPostRow, ForumThreadRow};
use crate::models::profile::PublicProfileRow;
use crate::profiles::repository::fetch_public_profiles;
use crate::state::AppState;
use crate::storage::validate_object_key;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_POST_CHARS: usize = 5000;
pub const MAX_TAGS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: i64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumCategory {
    Casting,
    Technology,
    Filmmaking,
    News,
}

impl ForumCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForumCategory::Casting => "casting",
            ForumCategory::Technology => "technology",
            ForumCategory::Filmmaking => "filmmaking",
            ForumCategory::News => "news",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_lowercase().as_str() {
            "casting" => Ok(ForumCategory::Casting),
            "technology" => Ok(ForumCategory::Technology),
            "filmmaking" => Ok(ForumCategory::Filmmaking),
            "news" => Ok(ForumCategory::News),
            other => Err(AppError::Validation(format!(
                "Unknown forum category '{other}'"
            ))),
        }
    }

    /// Category filter from a query string; `all` or nothing means no filter.
    pub fn filter(value: Option<&str>) -> Result<Option<Self>, AppError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
            Some(v) => Self::parse(v).map(Some),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    pub file_name: String,
    /// Object key in the forum-attachments bucket.
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
}

impl NewAttachment {
    fn validate(&self) -> Result<(), AppError> {
        if self.file_name.trim().is_empty() {
            return Err(AppError::Validation("file_name is required".to_string()));
        }
        if self.file_type.trim().is_empty() {
            return Err(AppError::Validation("file_type is required".to_string()));
        }
        if self.file_size <= 0 || self.file_size > MAX_ATTACHMENT_BYTES {
            return Err(AppError::Validation(format!(
                "Attachment '{}' must be between 1 byte and 20 MB",
                self.file_name.trim()
            )));
        }
        validate_object_key("file_path", &self.file_path)
    }
}

#[derive(Debug, Clone)]
pub struct NewThread {
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub content: String,
    pub tags: Vec<String>,
    pub attachments: Vec<NewAttachment>,
}

struct ValidThread {
    title: String,
    category: ForumCategory,
    content: String,
    tags: Vec<String>,
}

impl NewThread {
    fn validate(&self) -> Result<ValidThread, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        let category = ForumCategory::parse(&self.category)?;
        let content = validate_post_content(&self.content)?;
        let tags = normalize_tags(&self.tags)?;
        validate_attachments(&self.attachments)?;
        Ok(ValidThread {
            title: title.to_string(),
            category,
            content,
            tags,
        })
    }
}

pub fn validate_post_content(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(AppError::Validation(format!(
            "content must be at most {MAX_POST_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

/// Trims, lowercases and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, AppError> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    if normalized.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "A thread can have at most {MAX_TAGS} tags"
        )));
    }
    Ok(normalized)
}

fn validate_attachments(attachments: &[NewAttachment]) -> Result<(), AppError> {
    attachments.iter().try_for_each(NewAttachment::validate)
}

// ─── Views ────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ThreadCountRow {
    #[sqlx(flatten)]
    thread: ForumThreadRow,
    post_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: ForumThreadRow,
    pub author: Option<PublicProfileRow>,
    pub post_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    #[serde(flatten)]
    pub attachment: ForumAttachmentRow,
    /// Presigned download URL; absent when signing failed.
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: ForumPostRow,
    pub author: Option<PublicProfileRow>,
    pub attachments: Vec<AttachmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ForumThreadRow,
    pub author: Option<PublicProfileRow>,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    #[serde(flatten)]
    pub post: ForumPostRow,
    pub attachments: Vec<ForumAttachmentRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedThread {
    #[serde(flatten)]
    pub thread: ForumThreadRow,
    pub opening_post: CreatedPost,
}

// ─── Queries ──────────────────────────────────────────────────

/// Threads, pinned first and then newest, optionally in one category.
pub async fn list_threads(
    pool: &PgPool,
    category: Option<ForumCategory>,
) -> Result<Vec<ThreadSummary>, AppError> {
    let rows: Vec<ThreadCountRow> = sqlx::query_as(
        r#"
        SELECT t.*,
               (SELECT COUNT(*) FROM forum_posts p WHERE p.thread_id = t.id) AS post_count
        FROM forum_threads t
        WHERE ($1::text IS NULL OR t.category = $1)
        ORDER BY t.is_pinned DESC, t.created_at DESC
        "#,
    )
    .bind(category.map(|c| c.as_str()))
    .fetch_all(pool)
    .await?;

    let author_ids: Vec<Uuid> = rows.iter().map(|r| r.thread.user_id).collect();
    let profiles = fetch_public_profiles(pool, &author_ids).await?;

    Ok(rows
        .into_iter()
        .map(|r| ThreadSummary {
            author: profiles.get(&r.thread.user_id).cloned(),
            post_count: r.post_count,
            thread: r.thread,
        })
        .collect())
}

async fn insert_post(
    tx: &mut Transaction<'_, Postgres>,
    thread_id: Uuid,
    user_id: Uuid,
    content: &str,
    attachments: &[NewAttachment],
) -> Result<CreatedPost, sqlx::Error> {
    let post: ForumPostRow = sqlx::query_as(
        "INSERT INTO forum_posts (thread_id, user_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(thread_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(&mut **tx)
    .await?;

    let mut stored = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let row: ForumAttachmentRow = sqlx::query_as(
            r#"
            INSERT INTO forum_attachments (post_id, file_name, file_url, file_type, file_size)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(post.id)
        .bind(attachment.file_name.trim())
        .bind(attachment.file_path.trim())
        .bind(attachment.file_type.trim())
        .bind(attachment.file_size)
        .fetch_one(&mut **tx)
        .await?;
        stored.push(row);
    }

    Ok(CreatedPost {
        post,
        attachments: stored,
    })
}

/// Creates a thread with its opening post and attachment metadata.
pub async fn create_thread(pool: &PgPool, new: NewThread) -> Result<CreatedThread, AppError> {
    let valid = new.validate()?;

    let mut tx = pool.begin().await?;
    let thread: ForumThreadRow = sqlx::query_as(
        r#"
        INSERT INTO forum_threads (user_id, title, category, tags)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(&valid.title)
    .bind(valid.category.as_str())
    .bind(&valid.tags)
    .fetch_one(&mut *tx)
    .await?;

    let opening_post = insert_post(&mut tx, thread.id, new.user_id, &valid.content, &new.attachments).await?;
    tx.commit().await?;

    info!(
        "Forum thread {} created in {} with {} attachment(s)",
        thread.id,
        thread.category,
        opening_post.attachments.len()
    );
    Ok(CreatedThread {
        thread,
        opening_post,
    })
}

/// Loads a thread with its posts, counting the view.
pub async fn get_thread(state: &AppState, id: Uuid) -> Result<ThreadDetail, AppError> {
    let thread: ForumThreadRow = sqlx::query_as(
        "UPDATE forum_threads SET views = views + 1 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Thread {id} not found")))?;

    let posts: Vec<ForumPostRow> =
        sqlx::query_as("SELECT * FROM forum_posts WHERE thread_id = $1 ORDER BY created_at ASC")
            .bind(id)
            .fetch_all(&state.db)
            .await?;

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let attachments: Vec<ForumAttachmentRow> = sqlx::query_as(
        "SELECT * FROM forum_attachments WHERE post_id = ANY($1) ORDER BY created_at",
    )
    .bind(&post_ids)
    .fetch_all(&state.db)
    .await?;

    let mut by_post: HashMap<Uuid, Vec<AttachmentView>> = HashMap::new();
    for attachment in attachments {
        let download_url = match state.storage.forum_attachment_url(&attachment.file_url).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("No download link for attachment {}: {e}", attachment.id);
                None
            }
        };
        by_post
            .entry(attachment.post_id)
            .or_default()
            .push(AttachmentView {
                attachment,
                download_url,
            });
    }

    let mut user_ids: Vec<Uuid> = posts.iter().map(|p| p.user_id).collect();
    user_ids.push(thread.user_id);
    let profiles = fetch_public_profiles(&state.db, &user_ids).await?;

    let posts = posts
        .into_iter()
        .map(|post| PostView {
            author: profiles.get(&post.user_id).cloned(),
            attachments: by_post.remove(&post.id).unwrap_or_default(),
            post,
        })
        .collect();

    Ok(ThreadDetail {
        author: profiles.get(&thread.user_id).cloned(),
        thread,
        posts,
    })
}

/// Adds a reply to an open thread and bumps the thread.
pub async fn reply_to_thread(
    pool: &PgPool,
    thread_id: Uuid,
    user_id: Uuid,
    content: &str,
    attachments: &[NewAttachment],
) -> Result<CreatedPost, AppError> {
    let content = validate_post_content(content)?;
    validate_attachments(attachments)?;

    let thread: ForumThreadRow = sqlx::query_as("SELECT * FROM forum_threads WHERE id = $1")
        .bind(thread_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thread {thread_id} not found")))?;
    if thread.is_moderated {
        return Err(AppError::Forbidden(format!(
            "Thread {thread_id} is closed to replies"
        )));
    }

    let mut tx = pool.begin().await?;
    let post = insert_post(&mut tx, thread_id, user_id, &content, attachments).await?;
    sqlx::query("UPDATE forum_threads SET updated_at = now() WHERE id = $1")
        .bind(thread_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(size: i64, path: &str) -> NewAttachment {
        NewAttachment {
            file_name: "sides.pdf".to_string(),
            file_path: path.to_string(),
            file_type: "application/pdf".to_string(),
            file_size: size,
        }
    }

    fn thread(title: &str, category: &str, tags: &[&str]) -> NewThread {
        NewThread {
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            category: category.to_string(),
            content: "Any tips for self-tapes?".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            attachments: vec![],
        }
    }

    #[test]
    fn test_category_filter() {
        assert_eq!(ForumCategory::filter(None).unwrap(), None);
        assert_eq!(ForumCategory::filter(Some("all")).unwrap(), None);
        assert_eq!(ForumCategory::filter(Some(" ")).unwrap(), None);
        assert_eq!(
            ForumCategory::filter(Some("News")).unwrap(),
            Some(ForumCategory::News)
        );
        assert!(ForumCategory::filter(Some("gossip")).is_err());
    }

    #[test]
    fn test_tags_normalized() {
        let tags: Vec<String> = vec!["  Self-Tape ".into(), "self-tape".into(), "".into(), "Lighting".into()];
        assert_eq!(
            normalize_tags(&tags).unwrap(),
            vec!["self-tape".to_string(), "lighting".to_string()]
        );
    }

    #[test]
    fn test_too_many_tags() {
        let tags: Vec<String> = (0..6).map(|i| format!("tag{i}")).collect();
        assert!(normalize_tags(&tags).is_err());
        // duplicates collapse before counting
        let tags: Vec<String> = (0..8).map(|i| format!("tag{}", i % 5)).collect();
        assert_eq!(normalize_tags(&tags).unwrap().len(), 5);
    }

    #[test]
    fn test_thread_validation() {
        let valid = thread("  Self-tape setups  ", "technology", &["Gear"]).validate().unwrap();
        assert_eq!(valid.title, "Self-tape setups");
        assert_eq!(valid.category, ForumCategory::Technology);
        assert_eq!(valid.tags, vec!["gear".to_string()]);

        assert!(thread(" ", "technology", &[]).validate().is_err());
        assert!(thread(&"t".repeat(201), "technology", &[]).validate().is_err());
        assert!(thread("Ok", "recipes", &[]).validate().is_err());
    }

    #[test]
    fn test_post_content_bounds() {
        assert!(validate_post_content("   ").is_err());
        assert!(validate_post_content(&"x".repeat(MAX_POST_CHARS)).is_ok());
        assert!(validate_post_content(&"x".repeat(MAX_POST_CHARS + 1)).is_err());
    }

    #[test]
    fn test_attachment_limits() {
        assert!(attachment(MAX_ATTACHMENT_BYTES, "u1/sides.pdf").validate().is_ok());
        assert!(attachment(MAX_ATTACHMENT_BYTES + 1, "u1/sides.pdf").validate().is_err());
        assert!(attachment(0, "u1/sides.pdf").validate().is_err());
        assert!(attachment(1024, "../sides.pdf").validate().is_err());
    }
}
