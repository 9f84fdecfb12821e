use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::{ProjectRoleRow, ProjectRow, ProjectStatus};
use crate::projects::repository::{
    fetch_roles, fetch_roles_for, require_owned_project, require_project,
};
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 200;
const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct ProjectWithRoles {
    #[serde(flatten)]
    pub project: ProjectRow,
    pub roles: Vec<ProjectRoleRow>,
}

#[derive(Debug, Deserialize)]
pub struct NewRole {
    pub role_name: String,
    pub role_description: Option<String>,
    #[serde(default)]
    pub emotions: Vec<String>,
    pub requirements: Option<Value>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub director_id: Uuid,
    pub title: String,
    pub project_type: String,
    pub description: Option<String>,
    pub production_company: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub shoot_start_date: Option<NaiveDate>,
    pub shoot_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub remote_auditions_only: bool,
    pub mood_board_urls: Option<Value>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub roles: Vec<NewRole>,
}

impl CreateProjectRequest {
    /// Validates the request and drops roles with blank names.
    fn validate(mut self) -> Result<Self, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        self.title = title.to_string();

        if self.project_type.trim().is_empty() {
            return Err(AppError::Validation("project_type is required".to_string()));
        }
        self.project_type = self.project_type.trim().to_string();

        if let (Some(start), Some(end)) = (self.shoot_start_date, self.shoot_end_date) {
            if end < start {
                return Err(AppError::Validation(
                    "shoot_end_date cannot be before shoot_start_date".to_string(),
                ));
            }
        }

        self.roles.retain(|r| !r.role_name.trim().is_empty());
        for role in &mut self.roles {
            role.role_name = role.role_name.trim().to_string();
            if matches!(&role.requirements, Some(v) if !v.is_object() && !v.is_null()) {
                return Err(AppError::Validation(format!(
                    "requirements for role '{}' must be an object",
                    role.role_name
                )));
            }
            role.emotions.retain(|e| !e.trim().is_empty());
        }

        Ok(self)
    }

    fn status(&self) -> ProjectStatus {
        if self.is_draft {
            ProjectStatus::Draft
        } else {
            ProjectStatus::Open
        }
    }
}

/// POST /api/v1/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectWithRoles>), AppError> {
    let req = req.validate()?;
    let mut tx = state.db.begin().await?;

    let project: ProjectRow = sqlx::query_as(
        r#"
        INSERT INTO projects (
            director_id, title, project_type, description, production_company, location,
            deadline, shoot_start_date, shoot_end_date, remote_auditions_only,
            mood_board_urls, is_draft, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(req.director_id)
    .bind(&req.title)
    .bind(&req.project_type)
    .bind(&req.description)
    .bind(&req.production_company)
    .bind(&req.location)
    .bind(req.deadline)
    .bind(req.shoot_start_date)
    .bind(req.shoot_end_date)
    .bind(req.remote_auditions_only)
    .bind(&req.mood_board_urls)
    .bind(req.is_draft)
    .bind(req.status().as_str())
    .fetch_one(&mut *tx)
    .await?;

    let mut roles = Vec::with_capacity(req.roles.len());
    for role in &req.roles {
        let row: ProjectRoleRow = sqlx::query_as(
            r#"
            INSERT INTO project_roles
                (project_id, role_name, role_description, emotions, requirements, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(&role.role_name)
        .bind(&role.role_description)
        .bind(&role.emotions)
        .bind(&role.requirements)
        .bind(role.is_featured)
        .fetch_one(&mut *tx)
        .await?;
        roles.push(row);
    }

    tx.commit().await?;
    info!(
        "Project {} created by {} with {} role(s) [{}]",
        project.id,
        project.director_id,
        roles.len(),
        project.status
    );

    Ok((StatusCode::CREATED, Json(ProjectWithRoles { project, roles })))
}

#[derive(Deserialize)]
pub struct ProjectListQuery {
    pub project_type: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectListQuery>,
) -> Result<Json<Vec<ProjectWithRoles>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let project_type = params
        .project_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "all");

    let projects: Vec<ProjectRow> = sqlx::query_as(
        r#"
        SELECT * FROM projects
        WHERE status = 'open' AND is_draft = false
          AND ($1::text IS NULL OR project_type = $1)
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(project_type)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(attach_roles(&state, projects).await?))
}

/// GET /api/v1/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectWithRoles>, AppError> {
    let project = require_project(&state.db, id).await?;
    let roles = fetch_roles(&state.db, id).await?;
    Ok(Json(ProjectWithRoles { project, roles }))
}

/// GET /api/v1/directors/:user_id/projects
pub async fn handle_director_projects(
    State(state): State<AppState>,
    Path(director_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectWithRoles>>, AppError> {
    let projects: Vec<ProjectRow> =
        sqlx::query_as("SELECT * FROM projects WHERE director_id = $1 ORDER BY created_at DESC")
            .bind(director_id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(attach_roles(&state, projects).await?))
}

#[derive(Deserialize)]
pub struct DirectorBody {
    pub director_id: Uuid,
}

/// POST /api/v1/projects/:id/publish
pub async fn handle_publish_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DirectorBody>,
) -> Result<Json<ProjectWithRoles>, AppError> {
    let project = require_owned_project(&state.db, id, req.director_id).await?;
    if !project.is_status(ProjectStatus::Draft) {
        return Err(AppError::Conflict(format!(
            "Project {id} is {} and cannot be published",
            project.status
        )));
    }

    let project: ProjectRow = sqlx::query_as(
        "UPDATE projects SET status = $2, is_draft = false, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(ProjectStatus::Open.as_str())
    .fetch_one(&state.db)
    .await?;

    info!("Project {id} published");
    let roles = fetch_roles(&state.db, id).await?;
    Ok(Json(ProjectWithRoles { project, roles }))
}

async fn attach_roles(
    state: &AppState,
    projects: Vec<ProjectRow>,
) -> Result<Vec<ProjectWithRoles>, AppError> {
    let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let mut roles = fetch_roles_for(&state.db, &ids).await?;
    Ok(projects
        .into_iter()
        .map(|project| {
            let roles = roles.remove(&project.id).unwrap_or_default();
            ProjectWithRoles { project, roles }
        })
        .collect())
}
