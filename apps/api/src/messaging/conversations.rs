//! Two-party conversations between users. Every read and write checks that
//! the caller is a participant.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::messaging::{ConversationParticipantRow, ConversationRow, MessageRow};
use crate::models::profile::PublicProfileRow;
use crate::notifications::service::{message_notice, notify};
use crate::profiles::repository::{fetch_public_profile, fetch_public_profiles};

pub const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, FromRow)]
struct MembershipRow {
    #[sqlx(flatten)]
    conversation: ConversationRow,
    muted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: ConversationRow,
    pub other_user_id: Option<Uuid>,
    pub other_user_name: String,
    pub other_user_type: String,
    pub other_user_avatar: Option<String>,
    /// Whether the requesting user muted this conversation.
    pub muted: bool,
    pub last_message: Option<MessageRow>,
}

/// Trims message content and enforces 1–5000 characters.
pub fn validate_message(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

/// Display name and user type of the other party, with fallbacks for a
/// deleted or incomplete profile.
pub fn other_party(profile: Option<&PublicProfileRow>) -> (String, String) {
    let name = profile
        .and_then(|p| p.full_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown User")
        .to_string();
    let user_type = profile
        .map(|p| p.user_type.clone())
        .unwrap_or_else(|| "talent".to_string());
    (name, user_type)
}

/// Advisory-lock key for a user pair. Argument order does not matter.
fn pair_lock_key(a: Uuid, b: Uuid) -> i64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mixed = lo.as_u128() ^ hi.as_u128().rotate_left(64);
    ((mixed >> 64) as u64 ^ mixed as u64) as i64
}

async fn find_direct_conversation<'e, E>(
    executor: E,
    user_id: Uuid,
    other_user_id: Uuid,
) -> Result<Option<ConversationRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT c.*
        FROM conversations c
        JOIN conversation_participants a ON a.conversation_id = c.id AND a.user_id = $1
        JOIN conversation_participants b ON b.conversation_id = c.id AND b.user_id = $2
        WHERE (SELECT COUNT(*) FROM conversation_participants p WHERE p.conversation_id = c.id) = 2
        ORDER BY c.created_at
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(other_user_id)
    .fetch_optional(executor)
    .await
}

/// Returns the conversation between two users, creating it if needed.
/// The flag is true when a new conversation was created.
pub async fn create_or_get_conversation(
    pool: &PgPool,
    user_id: Uuid,
    other_user_id: Uuid,
) -> Result<(ConversationRow, bool), AppError> {
    if user_id == other_user_id {
        return Err(AppError::Validation(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    // Serializes concurrent starts for the same pair until commit.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(pair_lock_key(user_id, other_user_id))
        .execute(&mut *tx)
        .await?;
    if let Some(existing) = find_direct_conversation(&mut *tx, user_id, other_user_id).await? {
        tx.commit().await?;
        return Ok((existing, false));
    }

    let conversation: ConversationRow =
        sqlx::query_as("INSERT INTO conversations DEFAULT VALUES RETURNING *")
            .fetch_one(&mut *tx)
            .await?;
    sqlx::query(
        "INSERT INTO conversation_participants (conversation_id, user_id) VALUES ($1, $2), ($1, $3)",
    )
    .bind(conversation.id)
    .bind(user_id)
    .bind(other_user_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "Conversation {} started between {user_id} and {other_user_id}",
        conversation.id
    );
    Ok((conversation, true))
}

/// Loads the conversation and the caller's membership: 404 when the
/// conversation does not exist, 403 when the caller is not in it.
async fn require_participant(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<(ConversationRow, ConversationParticipantRow), AppError> {
    let conversation: ConversationRow = sqlx::query_as("SELECT * FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;

    let participant: ConversationParticipantRow = sqlx::query_as(
        "SELECT * FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::Forbidden(format!(
            "User {user_id} is not a participant of conversation {conversation_id}"
        ))
    })?;

    Ok((conversation, participant))
}

pub async fn list_conversations(
    pool: &PgPool,
    user_id: Uuid,
    include_archived: bool,
) -> Result<Vec<ConversationSummary>, AppError> {
    let memberships: Vec<MembershipRow> = sqlx::query_as(
        r#"
        SELECT c.*, p.muted
        FROM conversations c
        JOIN conversation_participants p ON p.conversation_id = c.id AND p.user_id = $1
        WHERE $2 OR NOT c.archived
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .bind(include_archived)
    .fetch_all(pool)
    .await?;

    if memberships.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = memberships.iter().map(|m| m.conversation.id).collect();

    let others: HashMap<Uuid, Uuid> = sqlx::query_as::<_, (Uuid, Uuid)>(
        r#"
        SELECT conversation_id, user_id
        FROM conversation_participants
        WHERE conversation_id = ANY($1) AND user_id <> $2
        "#,
    )
    .bind(&ids)
    .bind(user_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let other_ids: Vec<Uuid> = others.values().copied().collect();
    let profiles = fetch_public_profiles(pool, &other_ids).await?;

    let mut last_messages: HashMap<Uuid, MessageRow> = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT DISTINCT ON (conversation_id) *
        FROM messages
        WHERE conversation_id = ANY($1)
        ORDER BY conversation_id, created_at DESC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|m| (m.conversation_id, m))
    .collect();

    Ok(memberships
        .into_iter()
        .map(|m| {
            let other_user_id = others.get(&m.conversation.id).copied();
            let profile = other_user_id.and_then(|id| profiles.get(&id));
            let (other_user_name, other_user_type) = other_party(profile);
            ConversationSummary {
                other_user_id,
                other_user_name,
                other_user_type,
                other_user_avatar: profile.and_then(|p| p.avatar_url.clone()),
                muted: m.muted,
                last_message: last_messages.remove(&m.conversation.id),
                conversation: m.conversation,
            }
        })
        .collect())
}

pub async fn list_messages(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MessageRow>, AppError> {
    require_participant(pool, conversation_id, user_id).await?;
    let messages = sqlx::query_as(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

/// Stores a message, bumps the conversation and notifies every other
/// participant who has not muted it.
pub async fn send_message(
    pool: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> Result<MessageRow, AppError> {
    let content = validate_message(content)?;
    require_participant(pool, conversation_id, sender_id).await?;
    let sender_name = fetch_public_profile(pool, sender_id)
        .await?
        .and_then(|p| p.full_name)
        .unwrap_or_else(|| "Someone".to_string());

    let mut tx = pool.begin().await?;
    let message: MessageRow = sqlx::query_as(
        "INSERT INTO messages (conversation_id, sender_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(&content)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    let recipients: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT user_id FROM conversation_participants
        WHERE conversation_id = $1 AND user_id <> $2 AND NOT muted
        "#,
    )
    .bind(conversation_id)
    .bind(sender_id)
    .fetch_all(&mut *tx)
    .await?;
    for recipient in recipients {
        notify(&mut *tx, &message_notice(recipient, conversation_id, &sender_name)).await?;
    }

    tx.commit().await?;
    Ok(message)
}

pub async fn delete_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    require_participant(pool, conversation_id, user_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Conversation {conversation_id} deleted by {user_id}");
    Ok(())
}

pub async fn set_muted(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
    muted: bool,
) -> Result<ConversationParticipantRow, AppError> {
    require_participant(pool, conversation_id, user_id).await?;
    let row = sqlx::query_as(
        r#"
        UPDATE conversation_participants SET muted = $3
        WHERE conversation_id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(muted)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn set_archived(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
    archived: bool,
) -> Result<ConversationRow, AppError> {
    require_participant(pool, conversation_id, user_id).await?;
    let row = sqlx::query_as("UPDATE conversations SET archived = $2 WHERE id = $1 RETURNING *")
        .bind(conversation_id)
        .bind(archived)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(name: Option<&str>, user_type: &str) -> PublicProfileRow {
        PublicProfileRow {
            user_id: Uuid::new_v4(),
            full_name: name.map(str::to_string),
            avatar_url: None,
            bio: None,
            user_type: user_type.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_trimmed() {
        assert_eq!(validate_message("  see you at 9  ").unwrap(), "see you at 9");
    }

    #[test]
    fn test_message_length_bounds() {
        assert!(matches!(validate_message(" \n "), Err(AppError::Validation(_))));
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        // padding does not count
        assert!(validate_message(&format!("  {}  ", "a".repeat(MAX_MESSAGE_CHARS))).is_ok());
    }

    #[test]
    fn test_pair_lock_key_ignores_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(pair_lock_key(a, b), pair_lock_key(b, a));
        assert_ne!(pair_lock_key(a, b), pair_lock_key(a, c));
        assert_eq!(pair_lock_key(a, b), pair_lock_key(a, b));
    }

    #[test]
    fn test_other_party_fallbacks() {
        assert_eq!(
            other_party(None),
            ("Unknown User".to_string(), "talent".to_string())
        );
        assert_eq!(
            other_party(Some(&profile(Some("  "), "director"))),
            ("Unknown User".to_string(), "director".to_string())
        );
        assert_eq!(
            other_party(Some(&profile(Some("Rae Okafor"), "director"))),
            ("Rae Okafor".to_string(), "director".to_string())
        );
    }
}
