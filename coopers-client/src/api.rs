/// HTTP client for the Coopers API
///
/// [`TodoStore`] is the seam between the task board and wherever todos
/// live. [`ApiClient`] implements it over HTTP and also carries the
/// account endpoints (register, login, availability).
///
/// Non-2xx responses become [`ClientError::Api`] with the server's error
/// code and message.

use async_trait::async_trait;
use coopers_shared::{
    dto::{
        AvailabilityRequest, AvailabilityResponse, CreateTodoRequest, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse, UpdateTodoRequest,
    },
    models::todo::{Todo, TodoWithOwner},
};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use uuid::Uuid;

/// Request timeout for every API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client error types
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or undecodable response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Server answered with an error status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Machine-readable error code
        code: String,
        /// Human-readable message
        message: String,
    },

    /// A task call was made without a session token
    #[error("Not logged in")]
    NotLoggedIn,

    /// No todo with this id is on the board
    #[error("Unknown todo: {0}")]
    UnknownTodo(Uuid),

    /// Session cache could not be read or written
    #[error("Session cache error: {0}")]
    Cache(String),
}

impl ClientError {
    /// HTTP status of an API error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials or session
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Persistence operations the task board needs
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All of the caller's todos, newest first
    async fn list(&self) -> Result<Vec<TodoWithOwner>, ClientError>;

    /// Creates a todo and returns the stored record
    async fn create(&self, request: CreateTodoRequest) -> Result<Todo, ClientError>;

    /// Applies a partial update and returns the stored record
    async fn update(&self, request: UpdateTodoRequest) -> Result<Todo, ClientError>;

    /// Deletes a todo
    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

/// reqwest-backed API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the API at `base_url` (e.g. `http://localhost:8080`)
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("coopers-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// Sets (or clears) the session token sent to task endpoints
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Builder-style [`ApiClient::set_token`]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current session token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(builder.bearer_auth(token))
    }

    /// Registers a new account
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        let body = RegisterRequest {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };

        let response = self
            .http
            .post(self.url("/v1/auth/register")?)
            .json(&body)
            .send()
            .await?;

        parse(response).await
    }

    /// Logs in and returns the profile plus session token
    ///
    /// The token is not stored on the client; call [`ApiClient::set_token`].
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };

        let response = self
            .http
            .post(self.url("/v1/auth/login")?)
            .json(&body)
            .send()
            .await?;

        parse(response).await
    }

    /// Whether a username or email is already taken
    pub async fn check_availability(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, ClientError> {
        let body = AvailabilityRequest {
            username: username.map(String::from),
            email: email.map(String::from),
        };

        let response = self
            .http
            .post(self.url("/v1/auth/availability")?)
            .json(&body)
            .send()
            .await?;

        let availability: AvailabilityResponse = parse(response).await?;
        Ok(availability.exists)
    }
}

#[async_trait]
impl TodoStore for ApiClient {
    async fn list(&self) -> Result<Vec<TodoWithOwner>, ClientError> {
        let request = self.authorized(self.http.get(self.url("/v1/todos")?))?;
        parse(request.send().await?).await
    }

    async fn create(&self, request: CreateTodoRequest) -> Result<Todo, ClientError> {
        let builder = self.authorized(self.http.post(self.url("/v1/todos")?))?;
        parse(builder.json(&request).send().await?).await
    }

    async fn update(&self, request: UpdateTodoRequest) -> Result<Todo, ClientError> {
        let builder = self.authorized(self.http.put(self.url("/v1/todos")?))?;
        parse(builder.json(&request).send().await?).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let url = self.url(&format!("/v1/todos/{}", id))?;
        let response = self.authorized(self.http.delete(url))?.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if response.status().is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();

    match response.json::<ErrorBody>().await {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error,
            message: body.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "unknown".to_string(),
            message: status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn todo_json(owner: Uuid) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "content": "buy milk",
            "completed": false,
            "userId": owner,
            "version": 1,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z",
        })
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_task_calls_require_token() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.list().await, Err(ClientError::NotLoggedIn)));
        assert!(matches!(
            client.delete(Uuid::new_v4()).await,
            Err(ClientError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_login_decodes_profile_and_token() {
        let user_id = Uuid::new_v4();
        let app = Router::new().route(
            "/v1/auth/login",
            post(move |Json(body): Json<Value>| async move {
                assert_eq!(body["username"], "a");
                Json(json!({
                    "id": user_id,
                    "username": "a",
                    "email": "a@x.com",
                    "createdAt": "2025-01-01T00:00:00Z",
                    "token": "tok",
                    "expiresAt": "2025-01-02T00:00:00Z",
                }))
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let login = client.login("a", "secret1").await.unwrap();
        assert_eq!(login.profile.id, user_id);
        assert_eq!(login.profile.email, "a@x.com");
        assert_eq!(login.token, "tok");
    }

    #[tokio::test]
    async fn test_error_body_becomes_api_error() {
        let app = Router::new().route(
            "/v1/auth/login",
            post(|| async {
                (
                    AxumStatus::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Invalid username or password"
                    })),
                )
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        let err = client.login("a", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        match err {
            ClientError::Api { code, message, .. } => {
                assert_eq!(code, "unauthorized");
                assert_eq!(message, "Invalid username or password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_sends_bearer_token() {
        let owner = Uuid::new_v4();
        let app = Router::new().route(
            "/v1/todos",
            get(move |headers: HeaderMap| async move {
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer tok") {
                    return (AxumStatus::UNAUTHORIZED, Json(json!({"error": "unauthorized", "message": "no"})));
                }
                let mut todo = todo_json(owner);
                todo["user"] = json!({"id": owner, "username": "a", "email": "a@x.com"});
                (AxumStatus::OK, Json(json!([todo])))
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap().with_token("tok");

        let todos = client.list().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].todo.content, "buy milk");
        assert_eq!(todos[0].user.id, owner);
    }

    #[tokio::test]
    async fn test_availability_returns_flag() {
        let app = Router::new().route(
            "/v1/auth/availability",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "exists": body["username"] == "taken" }))
            }),
        );
        let client = ApiClient::new(&serve(app).await).unwrap();

        assert!(client.check_availability(Some("taken"), None).await.unwrap());
        assert!(!client.check_availability(Some("free"), None).await.unwrap());
    }
}
