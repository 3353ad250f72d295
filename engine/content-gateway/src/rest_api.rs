//! REST API endpoints for the ContentGateway
//!
//! One route per exposed engagement operation: view recording, the analytics
//! rollups, and personalized suggestions. Population-wide analytics are
//! gated to administrator roles; suggestions only require an authenticated
//! identity; view recording also accepts anonymous visitors.

use crate::auth::{bearer_token, Identity, IdentityVerifier};
use crate::error::GatewayError;
use analytics_engine::{AnalyticsEngine, AnalyticsError};
use content_store::{ContentId, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use suggestion_engine::{SuggestionEngine, SuggestionError};
use view_tracker::{TrackError, ViewTracker};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Shared handles the route handlers close over
#[derive(Clone)]
pub struct GatewayContext {
    pub tracker: Arc<ViewTracker>,
    pub analytics: Arc<AnalyticsEngine>,
    pub suggestions: Arc<SuggestionEngine>,
    pub verifier: Arc<IdentityVerifier>,
}

/// Body of `POST /views`
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackViewRequest {
    pub content_id: ContentId,
    pub duration_secs: Option<u32>,
}

/// Response of `GET /analytics/active-users`
#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveUsersResponse {
    #[serde(rename = "activeUsers")]
    pub active_users: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct PeriodParams {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DaysParams {
    days: Option<u32>,
}

/// Typed rejection carrying the HTTP mapping of an engine error
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl warp::reject::Reject for ApiError {}

fn reject_with(status: StatusCode, code: &'static str, message: String) -> Rejection {
    warp::reject::custom(ApiError { status, code, message })
}

fn unauthorized(message: String) -> Rejection {
    reject_with(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
}

fn store_error(err: StoreError) -> Rejection {
    if err.is_not_found() {
        reject_with(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
    } else {
        reject_with(StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", err.to_string())
    }
}

fn track_error(err: TrackError) -> Rejection {
    let message = err.to_string();
    let source_rejection = store_error(err.source);
    // keep the step-tagged message, reuse the source's status mapping
    match source_rejection.find::<ApiError>() {
        Some(api) => reject_with(api.status, api.code, message),
        None => reject_with(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message),
    }
}

fn analytics_error(err: AnalyticsError) -> Rejection {
    match err {
        AnalyticsError::InvalidArgument(message) => {
            reject_with(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message)
        }
        AnalyticsError::Store(source) => store_error(source),
    }
}

fn suggestion_error(err: SuggestionError) -> Rejection {
    match err {
        SuggestionError::UserNotFound(_) => {
            reject_with(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        SuggestionError::InvalidArgument(message) => {
            reject_with(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message)
        }
        SuggestionError::Store(source) => store_error(source),
    }
}

fn verify_header(verifier: &IdentityVerifier, header: &str) -> Result<Identity, GatewayError> {
    verifier.verify(bearer_token(header)?)
}

fn with_context(
    ctx: GatewayContext,
) -> impl Filter<Extract = (GatewayContext,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// Require an authenticated identity
fn identity(
    verifier: Arc<IdentityVerifier>,
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let verifier = verifier.clone();
        async move {
            match header {
                Some(value) => {
                    verify_header(&verifier, &value).map_err(|e| unauthorized(e.to_string()))
                }
                None => Err(unauthorized("missing authorization header".to_string())),
            }
        }
    })
}

/// Accept an identity when present, anonymous otherwise
fn optional_identity(
    verifier: Arc<IdentityVerifier>,
) -> impl Filter<Extract = (Option<Identity>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let verifier = verifier.clone();
        async move {
            match header {
                Some(value) => verify_header(&verifier, &value)
                    .map(Some)
                    .map_err(|e| unauthorized(e.to_string())),
                None => Ok(None),
            }
        }
    })
}

/// Require an administrator identity
fn elevated_identity(
    verifier: Arc<IdentityVerifier>,
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    identity(verifier).and_then(|ident: Identity| async move {
        if ident.role.is_elevated() {
            Ok(ident)
        } else {
            Err(reject_with(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "requires an administrator role".to_string(),
            ))
        }
    })
}

/// Record a view, authenticated or anonymous
async fn track_view(
    body: TrackViewRequest,
    viewer: Option<Identity>,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    ctx.tracker
        .record_view(body.content_id, viewer.map(|v| v.user_id), body.duration_secs)
        .await
        .map_err(track_error)?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

/// Views grouped by time period
async fn get_views_over_time(
    params: PeriodParams,
    _identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let buckets = ctx
        .analytics
        .views_over_time(params.period.as_deref().unwrap_or("daily"))
        .await
        .map_err(analytics_error)?;
    Ok(warp::reply::json(&buckets))
}

/// Most viewed content, with author profiles
async fn get_popular_content(
    params: LimitParams,
    _identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let popular = ctx
        .analytics
        .popular_content(params.limit.unwrap_or(10))
        .await
        .map_err(analytics_error)?;
    Ok(warp::reply::json(&popular))
}

/// Registrations grouped by time period
async fn get_registrations(
    params: PeriodParams,
    _identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let buckets = ctx
        .analytics
        .registrations_over_time(params.period.as_deref().unwrap_or("daily"))
        .await
        .map_err(analytics_error)?;
    Ok(warp::reply::json(&buckets))
}

/// Count of recently active users
async fn get_active_users(
    params: DaysParams,
    _identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let active_users =
        ctx.analytics.active_user_count(params.days).await.map_err(analytics_error)?;
    Ok(warp::reply::json(&ActiveUsersResponse { active_users }))
}

/// Role distribution across the user population
async fn get_role_distribution(
    _identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let distribution = ctx.analytics.role_distribution().await.map_err(analytics_error)?;
    Ok(warp::reply::json(&distribution))
}

/// Personalized suggestions for the calling identity
async fn get_suggestions(
    params: LimitParams,
    identity: Identity,
    ctx: GatewayContext,
) -> Result<impl Reply, Rejection> {
    let suggestions = ctx
        .suggestions
        .suggest(identity.user_id, params.limit)
        .await
        .map_err(suggestion_error)?;
    Ok(warp::reply::json(&suggestions))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, code, message) = if let Some(api) = err.find::<ApiError>() {
        (api.status, api.code, api.message.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "NOT_FOUND", "no such route".to_string())
    } else if let Some(body) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "INVALID_BODY", body.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "INVALID_QUERY", "malformed query string".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", "method not allowed".to_string())
    } else {
        tracing::error!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error".to_string())
    };

    let body = ErrorResponse {
        error: ErrorDetail { code: code.to_string(), message },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Build the complete route tree
pub fn create_routes(
    ctx: GatewayContext,
) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
    let verifier = ctx.verifier.clone();

    let track = warp::path("views")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(optional_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(track_view);

    let views_over_time = warp::path("analytics")
        .and(warp::path("views"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<PeriodParams>())
        .and(elevated_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(get_views_over_time);

    let popular = warp::path("analytics")
        .and(warp::path("popular"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<LimitParams>())
        .and(elevated_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(get_popular_content);

    let registrations = warp::path("analytics")
        .and(warp::path("registrations"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<PeriodParams>())
        .and(elevated_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(get_registrations);

    let active_users = warp::path("analytics")
        .and(warp::path("active-users"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<DaysParams>())
        .and(elevated_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(get_active_users);

    let roles = warp::path("analytics")
        .and(warp::path("roles"))
        .and(warp::path::end())
        .and(warp::get())
        .and(elevated_identity(verifier.clone()))
        .and(with_context(ctx.clone()))
        .and_then(get_role_distribution);

    let suggestions = warp::path("suggestions")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<LimitParams>())
        .and(identity(verifier))
        .and(with_context(ctx))
        .and_then(get_suggestions);

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    track
        .or(views_over_time)
        .or(popular)
        .or(registrations)
        .or(active_users)
        .or(roles)
        .or(suggestions)
        .or(health)
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtClaims;
    use chrono::Utc;
    use content_store::{ContentItem, MemoryStore, Role, UserRecord};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "gateway-test-secret";

    fn token(user_id: Uuid, role: &str) -> String {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (Utc::now().timestamp() + 3600) as u64,
        };
        let header = format!(
            "Bearer {}",
            encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
                .unwrap()
        );
        header
    }

    fn context() -> (Arc<MemoryStore>, GatewayContext) {
        let store = Arc::new(MemoryStore::new());
        let ctx = GatewayContext {
            tracker: Arc::new(ViewTracker::new(store.clone(), store.clone(), store.clone())),
            analytics: Arc::new(AnalyticsEngine::new(store.clone(), store.clone(), store.clone())),
            suggestions: Arc::new(SuggestionEngine::new(store.clone(), store.clone())),
            verifier: Arc::new(IdentityVerifier::new(SECRET)),
        };
        (store, ctx)
    }

    fn seed_user(store: &MemoryStore, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        store.insert_user(UserRecord {
            id,
            username: format!("u{id}"),
            avatar_url: None,
            role,
            interests: vec!["rust".to_string()],
            view_history: Vec::new(),
            last_login_at: Utc::now(),
            created_at: Utc::now(),
        });
        id
    }

    fn seed_content(store: &MemoryStore) -> Uuid {
        let id = Uuid::new_v4();
        store.insert_content(ContentItem {
            id,
            title: "post".to_string(),
            author_id: Uuid::new_v4(),
            tags: vec!["rust".to_string()],
            view_count: 0,
            published: true,
            created_at: Utc::now(),
        });
        id
    }

    #[tokio::test]
    async fn anonymous_view_is_accepted() {
        let (store, ctx) = context();
        let content_id = seed_content(&store);
        let routes = create_routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/views")
            .json(&TrackViewRequest { content_id, duration_secs: Some(12) })
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let item = content_store::ContentStore::find_by_id(store.as_ref(), content_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.view_count, 1);
    }

    #[tokio::test]
    async fn analytics_requires_elevated_role() {
        let (store, ctx) = context();
        let user_id = seed_user(&store, Role::User);
        let routes = create_routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/analytics/roles")
            .header("authorization", token(user_id, "user"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let admin_id = seed_user(&store, Role::Admin);
        let resp = warp::test::request()
            .method("GET")
            .path("/analytics/roles")
            .header("authorization", token(admin_id, "admin"))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn active_users_uses_the_expected_body_shape() {
        let (store, ctx) = context();
        let admin_id = seed_user(&store, Role::Admin);
        let routes = create_routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/analytics/active-users")
            .header("authorization", token(admin_id, "admin"))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert!(body.get("activeUsers").is_some());
    }

    #[tokio::test]
    async fn suggestions_require_authentication() {
        let (_store, ctx) = context();
        let routes = create_routes(ctx);

        let resp = warp::test::request().method("GET").path("/suggestions").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn suggestions_return_for_authenticated_user() {
        let (store, ctx) = context();
        let user_id = seed_user(&store, Role::User);
        seed_content(&store);
        let routes = create_routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/suggestions")
            .header("authorization", token(user_id, "user"))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Vec<serde_json::Value> = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.len(), 1);
    }

    #[tokio::test]
    async fn zero_limit_is_a_bad_request() {
        let (store, ctx) = context();
        let admin_id = seed_user(&store, Role::Admin);
        let routes = create_routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/analytics/popular?limit=0")
            .header("authorization", token(admin_id, "admin"))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    }
}
