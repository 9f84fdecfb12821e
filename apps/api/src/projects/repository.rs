use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::{ProjectRoleRow, ProjectRow};

pub async fn fetch_project<'e, E>(executor: E, id: Uuid) -> Result<Option<ProjectRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Loads a project, 404 if absent.
pub async fn require_project(pool: &PgPool, id: Uuid) -> Result<ProjectRow, AppError> {
    fetch_project(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
}

/// Loads a project the given director owns: 404 if absent, 403 if someone else's.
pub async fn require_owned_project(
    pool: &PgPool,
    id: Uuid,
    director_id: Uuid,
) -> Result<ProjectRow, AppError> {
    let project = require_project(pool, id).await?;
    ensure_owner(&project, director_id)?;
    Ok(project)
}

pub fn ensure_owner(project: &ProjectRow, director_id: Uuid) -> Result<(), AppError> {
    if project.director_id != director_id {
        return Err(AppError::Forbidden(format!(
            "Project {} belongs to another director",
            project.id
        )));
    }
    Ok(())
}

pub async fn fetch_roles(pool: &PgPool, project_id: Uuid) -> Result<Vec<ProjectRoleRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM project_roles WHERE project_id = $1 ORDER BY is_featured DESC, created_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Roles for several projects, grouped by project id.
pub async fn fetch_roles_for(
    pool: &PgPool,
    project_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ProjectRoleRow>>, sqlx::Error> {
    if project_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<ProjectRoleRow> = sqlx::query_as(
        "SELECT * FROM project_roles WHERE project_id = ANY($1) ORDER BY is_featured DESC, created_at",
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ProjectRoleRow>> = HashMap::new();
    for role in rows {
        grouped.entry(role.project_id).or_default().push(role);
    }
    Ok(grouped)
}

pub async fn fetch_role(pool: &PgPool, role_id: Uuid) -> Result<Option<ProjectRoleRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM project_roles WHERE id = $1")
        .bind(role_id)
        .fetch_optional(pool)
        .await
}
