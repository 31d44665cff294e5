use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, Method},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use quorum_forum::commands::{answers, notifications, profile, questions, replies, voting};
use quorum_forum::{Forum, NewUser};
use quorum_shared::{
    AnswerId, NotificationId, QuestionId, QuestionSort, ReplyId, UserId, VoteDirection,
};
use quorum_store::{Notification, Question, User, VoteOutcome};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub forum: Arc<Forum>,
    pub config: Arc<ServerConfig>,
    pub rate_limiter: RateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/signup", post(auth_signup))
        .route("/auth/login", post(auth_login))
        .route("/me", get(me).put(me_update))
        .route("/questions", get(questions_list).post(questions_create))
        .route(
            "/questions/:id",
            get(questions_detail).delete(questions_delete),
        )
        .route("/questions/:id/answers", post(answers_create))
        .route("/questions/:id/vote", post(questions_vote))
        .route("/answers/:id", delete(answers_delete))
        .route("/answers/:id/replies", post(replies_create))
        .route("/answers/:id/vote", post(answers_vote))
        .route("/replies/:id", delete(replies_delete))
        .route("/notifications", get(notifications_list))
        .route("/notifications/unread", get(notifications_unread))
        .route("/notifications/:id/read", post(notifications_mark_read))
        .route("/notifications/:id", delete(notifications_dismiss))
        .route("/users/:id", get(users_profile))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Auth extractors
// ---------------------------------------------------------------------------

/// The signed-in caller, resolved from the bearer token. Required on every
/// write route.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ServerError::MissingToken)?;
        let id = state.forum.auth().verify_token(token)?;
        let user = state.forum.user(id)?;
        Ok(CurrentUser(user))
    }
}

/// Like [`CurrentUser`] but tolerates anonymous callers. A present but
/// invalid token is still an error, so an expired session never silently
/// degrades to an anonymous view.
pub struct MaybeUser(pub Option<User>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeUser(None)),
            Some(token) => {
                let id = state.forum.auth().verify_token(token)?;
                Ok(MaybeUser(Some(state.forum.user(id)?)))
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    registration_open: bool,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SessionResponse {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct ListQuery {
    sort: Option<String>,
}

#[derive(Deserialize)]
struct BodyRequest {
    body: String,
}

#[derive(Deserialize)]
struct VoteRequest {
    /// 1 for an upvote, -1 for a downvote.
    direction: i64,
}

#[derive(Serialize)]
struct UnreadResponse {
    unread: u32,
}

/// Public profile view. Deliberately omits the email address.
#[derive(Serialize)]
struct ProfileResponse {
    id: UserId,
    display_name: String,
    first_name: Option<String>,
    last_name: Option<String>,
    photo_url: Option<String>,
    reputation: i64,
    questions_asked: i64,
    answers_given: i64,
    join_date: chrono::DateTime<chrono::Utc>,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            display_name: u.display_name,
            first_name: u.first_name,
            last_name: u.last_name,
            photo_url: u.photo_url,
            reputation: u.reputation,
            questions_asked: u.questions_asked,
            answers_given: u.answers_given,
            join_date: u.join_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        registration_open: state.config.registration_open,
    })
}

async fn auth_signup(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<Json<SessionResponse>, ServerError> {
    if !state.config.registration_open {
        return Err(ServerError::RegistrationClosed);
    }
    let user = state.forum.sign_up(input)?;
    let token = state.forum.auth().issue_token(&user)?;
    Ok(Json(SessionResponse { user, token }))
}

async fn auth_login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let (user, token) = state.forum.sign_in(&input.email, &input.password)?;
    Ok(Json(SessionResponse { user, token }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn me_update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(edit): Json<profile::EditProfile>,
) -> Result<Json<User>, ServerError> {
    Ok(Json(profile::update_profile(&state.forum, &user, edit)?))
}

async fn questions_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Question>>, ServerError> {
    let sort = match query.sort.as_deref() {
        None => QuestionSort::Newest,
        Some(raw) => raw
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("unknown sort: {raw}")))?,
    };
    Ok(Json(questions::list_questions(&state.forum, sort)?))
}

async fn questions_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<questions::NewQuestion>,
) -> Result<Json<Question>, ServerError> {
    Ok(Json(questions::ask_question(&state.forum, &user, input)?))
}

async fn questions_detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<questions::QuestionDetail>, ServerError> {
    let viewer_id = viewer.map(|u| u.id);
    Ok(Json(questions::question_detail(
        &state.forum,
        viewer_id,
        QuestionId(id),
    )?))
}

async fn questions_delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    questions::delete_question(&state.forum, &user, QuestionId(id))?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn answers_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BodyRequest>,
) -> Result<Json<quorum_store::Answer>, ServerError> {
    Ok(Json(answers::post_answer(
        &state.forum,
        &user,
        QuestionId(id),
        input.body,
    )?))
}

async fn answers_delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    answers::delete_answer(&state.forum, &user, AnswerId(id))?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn replies_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BodyRequest>,
) -> Result<Json<quorum_store::Reply>, ServerError> {
    Ok(Json(replies::post_reply(
        &state.forum,
        &user,
        AnswerId(id),
        input.body,
    )?))
}

async fn replies_delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    replies::delete_reply(&state.forum, &user, ReplyId(id))?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn questions_vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>, ServerError> {
    let direction = parse_direction(input.direction)?;
    Ok(Json(voting::vote_question(
        &state.forum,
        &user,
        QuestionId(id),
        direction,
    )?))
}

async fn answers_vote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>, ServerError> {
    let direction = parse_direction(input.direction)?;
    Ok(Json(voting::vote_answer(
        &state.forum,
        &user,
        AnswerId(id),
        direction,
    )?))
}

fn parse_direction(raw: i64) -> Result<VoteDirection, ServerError> {
    VoteDirection::try_from(raw)
        .map_err(|_| ServerError::BadRequest(format!("direction must be 1 or -1, got {raw}")))
}

async fn notifications_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Notification>>, ServerError> {
    Ok(Json(notifications::list_notifications(&state.forum, &user)?))
}

async fn notifications_unread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadResponse>, ServerError> {
    let unread = notifications::unread_count(&state.forum, &user)?;
    Ok(Json(UnreadResponse { unread }))
}

async fn notifications_mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    notifications::mark_read(&state.forum, &user, NotificationId(id))?;
    Ok(Json(serde_json::json!({ "read": true })))
}

async fn notifications_dismiss(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServerError> {
    notifications::dismiss(&state.forum, &user, NotificationId(id))?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn users_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ServerError> {
    let user = profile::get_profile(&state.forum, UserId(id))?;
    Ok(Json(user.into()))
}


pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    tracing::info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
