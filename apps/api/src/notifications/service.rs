//! In-app notifications. Other modules write them inside their own
//! transactions through `notify`.

use serde_json::{json, Value};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::notification::{NotificationKind, NotificationRow};

const MAX_PAGE: i64 = 100;
const DEFAULT_PAGE: i64 = 50;

pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    pub metadata: Option<Value>,
}

pub async fn notify<'e, E>(executor: E, notification: &NewNotification) -> Result<Uuid, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO notifications (user_id, type, title, content, link, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.kind.as_str())
    .bind(&notification.title)
    .bind(&notification.content)
    .bind(&notification.link)
    .bind(&notification.metadata)
    .fetch_one(executor)
    .await
}

pub fn shortlisted_notice(talent_id: Uuid, project_id: Uuid, project_title: &str) -> NewNotification {
    NewNotification {
        user_id: talent_id,
        kind: NotificationKind::Shortlist,
        title: "You've been shortlisted!".to_string(),
        content: format!("Congratulations! You've been shortlisted for \"{project_title}\"."),
        link: Some(format!("/projects/{project_id}")),
        metadata: Some(json!({ "project_id": project_id })),
    }
}

pub fn selected_notice(
    talent_id: Uuid,
    project_id: Uuid,
    project_title: &str,
    application_id: Uuid,
) -> NewNotification {
    NewNotification {
        user_id: talent_id,
        kind: NotificationKind::Selection,
        title: "You've been selected!".to_string(),
        content: format!(
            "Congratulations! You've been selected for \"{project_title}\". The project has been added to your portfolio."
        ),
        link: Some("/portfolio".to_string()),
        metadata: Some(json!({ "project_id": project_id, "application_id": application_id })),
    }
}

pub fn message_notice(recipient_id: Uuid, conversation_id: Uuid, sender_name: &str) -> NewNotification {
    NewNotification {
        user_id: recipient_id,
        kind: NotificationKind::Message,
        title: "New message".to_string(),
        content: format!("{sender_name} sent you a message."),
        link: Some(format!("/messages/{conversation_id}")),
        metadata: Some(json!({ "conversation_id": conversation_id })),
    }
}

pub fn application_notice(
    director_id: Uuid,
    project_id: Uuid,
    project_title: &str,
    talent_name: &str,
) -> NewNotification {
    NewNotification {
        user_id: director_id,
        kind: NotificationKind::Application,
        title: "New application".to_string(),
        content: format!("{talent_name} applied to \"{project_title}\"."),
        link: Some(format!("/projects/{project_id}/applications")),
        metadata: Some(json!({ "project_id": project_id })),
    }
}

pub fn page_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
}

pub async fn list_notifications(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<NotificationRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1 AND ($2 = false OR read = false)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = false")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Marks one notification read. Returns false when it does not belong to the user.
pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET read = true WHERE user_id = $1 AND read = false")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
