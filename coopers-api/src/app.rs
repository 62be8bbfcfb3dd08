/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use coopers_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = coopers_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Key used to sign and verify session tokens
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }

    /// Lifetime of newly issued sessions
    pub fn session_ttl(&self) -> chrono::Duration {
        self.config.session_ttl()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /availability
///     └── /todos/                 (Bearer session required)
///         ├── GET    /            list the caller's todos
///         ├── POST   /            create
///         ├── PUT    /            partial update, id in body
///         └── DELETE /:id
/// ```
///
/// Layers, innermost first: request tracing, CORS, security headers.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/availability", post(routes::auth::check_availability));

    let todo_routes = Router::new()
        .route(
            "/",
            get(routes::todos::list_todos)
                .post(routes::todos::create_todo)
                .put(routes::todos::update_todo),
        )
        .route("/:id", delete(routes::todos::delete_todo))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/todos", todo_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, SessionConfig};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use coopers_shared::auth::session::issue_session;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    // The pool is never connected; these requests are all rejected before
    // any query runs.
    fn test_app() -> Router {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/unused".to_string(),
                max_connections: 1,
            },
            session: SessionConfig {
                secret: SECRET.to_string(),
                ttl_hours: 24,
            },
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        build_router(AppState::new(pool, config))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_todos_require_session() {
        let response = test_app()
            .oneshot(Request::builder().uri("/v1/todos").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_todos_reject_forged_token() {
        let forged = issue_session(
            Uuid::new_v4(),
            "mallory",
            "a-different-secret-that-is-32-bytes-long",
            chrono::Duration::hours(1),
        )
        .unwrap();

        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/v1/todos")
                    .header("authorization", format!("Bearer {}", forged.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_missing_field_is_bad_request() {
        let response = test_app()
            .oneshot(json_request(
                "POST",
                "/v1/auth/register",
                r#"{"email":"a@x.com","password":"secret1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "All fields are required");
    }

    #[tokio::test]
    async fn test_login_missing_password_is_bad_request() {
        let response = test_app()
            .oneshot(json_request("POST", "/v1/auth/login", r#"{"username":"a"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Username and password are required"
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = test_app()
            .oneshot(json_request("POST", "/v1/auth/login", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_availability_requires_a_field() {
        let response = test_app()
            .oneshot(json_request(
                "POST",
                "/v1/auth/availability",
                r#"{"username":"","email":""}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_for_another_user_is_forbidden() {
        let caller = Uuid::new_v4();
        let session =
            issue_session(caller, "ada", SECRET, chrono::Duration::hours(1)).unwrap();

        let body = format!(r#"{{"content":"buy milk","userId":"{}"}}"#, Uuid::new_v4());
        let mut request = json_request("POST", "/v1/todos", &body);
        request.headers_mut().insert(
            "authorization",
            format!("Bearer {}", session.token).parse().unwrap(),
        );

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_without_changes_is_bad_request() {
        let session =
            issue_session(Uuid::new_v4(), "ada", SECRET, chrono::Duration::hours(1)).unwrap();

        let body = format!(r#"{{"id":"{}"}}"#, Uuid::new_v4());
        let mut request = json_request("PUT", "/v1/todos", &body);
        request.headers_mut().insert(
            "authorization",
            format!("Bearer {}", session.token).parse().unwrap(),
        );

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_without_id_is_bad_request() {
        let session =
            issue_session(Uuid::new_v4(), "ada", SECRET, chrono::Duration::hours(1)).unwrap();

        let mut request = json_request("PUT", "/v1/todos", r#"{"completed":true}"#);
        request.headers_mut().insert(
            "authorization",
            format!("Bearer {}", session.token).parse().unwrap(),
        );

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Todo id is required");
    }

    #[tokio::test]
    async fn test_security_headers_on_public_routes() {
        let response = test_app()
            .oneshot(json_request("POST", "/v1/auth/login", "{}"))
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }
}
