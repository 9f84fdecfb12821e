pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use crate::applications::handlers as apps;
    use crate::auditions::handlers as auds;
    use crate::forums::handlers as fora;
    use crate::matching::handlers as ai;
    use crate::messaging::handlers as msg;
    use crate::notifications::handlers as notes;
    use crate::profiles::handlers as prof;
    use crate::projects::handlers as proj;
    use crate::shortlist::handlers as short;

    Router::new()
        // Profiles
        .route("/profiles", get(prof::handle_list_profiles))
        .route(
            "/profiles/:user_id",
            get(prof::handle_get_profile).put(prof::handle_update_profile),
        )
        .route(
            "/talent/:user_id",
            get(prof::handle_get_talent).put(prof::handle_upsert_talent),
        )
        .route("/talent/:user_id/portfolio", get(prof::handle_get_portfolio))
        .route(
            "/talent/:user_id/applications",
            get(apps::handle_talent_applications),
        )
        .route("/talent/:user_id/auditions", get(auds::handle_talent_auditions))
        .route(
            "/directors/:user_id",
            get(prof::handle_get_director).put(prof::handle_upsert_director),
        )
        .route("/directors/:user_id/team", post(prof::handle_invite_team_member))
        .route(
            "/directors/:user_id/completed-projects",
            get(prof::handle_completed_projects),
        )
        .route("/directors/:user_id/projects", get(proj::handle_director_projects))
        // Projects and applications
        .route(
            "/projects",
            get(proj::handle_list_projects).post(proj::handle_create_project),
        )
        .route("/projects/:id", get(proj::handle_get_project))
        .route("/projects/:id/publish", post(proj::handle_publish_project))
        .route(
            "/projects/:id/applications",
            get(apps::handle_project_applications).post(apps::handle_apply),
        )
        // Shortlisting
        .route("/projects/:id/shortlist/ai", post(short::handle_ai_shortlist))
        .route(
            "/projects/:id/shortlist/manual",
            post(short::handle_manual_shortlist),
        )
        .route("/projects/:id/selection", post(short::handle_final_selection))
        // Auditions
        .route("/auditions", post(auds::handle_create_audition))
        .route("/auditions/:id", get(auds::handle_get_audition))
        .route("/auditions/:id/evaluate", post(auds::handle_evaluate_audition))
        // Matching
        .route("/ai/analyze-profile", post(ai::handle_analyze_profile))
        .route("/ai/match-talent", post(ai::handle_match_talent))
        .route(
            "/ai/recommend-candidates",
            post(ai::handle_recommend_candidates),
        )
        .route(
            "/ai/reword-role-description",
            post(ai::handle_reword_role_description),
        )
        // Messaging
        .route(
            "/conversations",
            get(msg::handle_list_conversations).post(msg::handle_start_conversation),
        )
        .route(
            "/conversations/:id",
            delete(msg::handle_delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(msg::handle_list_messages).post(msg::handle_send_message),
        )
        .route("/conversations/:id/mute", patch(msg::handle_mute_conversation))
        .route(
            "/conversations/:id/archive",
            patch(msg::handle_archive_conversation),
        )
        // Forums
        .route(
            "/forums/threads",
            get(fora::handle_list_threads).post(fora::handle_create_thread),
        )
        .route("/forums/threads/:id", get(fora::handle_get_thread))
        .route("/forums/threads/:id/posts", post(fora::handle_reply))
        // Notifications
        .route("/notifications", get(notes::handle_list_notifications))
        .route("/notifications/unread-count", get(notes::handle_unread_count))
        .route("/notifications/read-all", post(notes::handle_mark_all_read))
        .route("/notifications/:id/read", patch(notes::handle_mark_read))
}
