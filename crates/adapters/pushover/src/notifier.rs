//! HTTP client for the Pushover message and user validation endpoints.

use std::time::Duration;

use serde::Deserialize;

use homelog_app::ports::{DeliveryResult, Notifier};

use crate::error::PushoverError;

pub const DEFAULT_API_URL: &str = "https://api.pushover.net";

const MESSAGES: &str = "/1/messages.json";
const VALIDATE_USER: &str = "/1/users/validate.json";

/// Configuration for the Pushover notifier.
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    /// Application API token.
    pub token: String,
    /// User (or group) keys receiving every message.
    pub user_keys: Vec<String>,
    /// Base URL of the API, without trailing path.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl PushoverConfig {
    pub fn new(token: impl Into<String>, user_keys: Vec<String>) -> Self {
        Self {
            token: token.into(),
            user_keys,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Body shared by every Pushover endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i32,
    request: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    devices: Vec<String>,
    /// Set to `"invalid"` when the application token is refused.
    token: Option<String>,
}

/// Sends every message to each configured Pushover user.
#[derive(Debug, Clone)]
pub struct PushoverNotifier {
    client: reqwest::Client,
    token: String,
    api_url: String,
    users: Vec<String>,
}

impl PushoverNotifier {
    /// Build a notifier addressing every configured user key, without
    /// contacting the API.
    ///
    /// # Errors
    ///
    /// Returns [`PushoverError::MissingToken`] if the token is empty, or
    /// [`PushoverError::Http`] if the HTTP client cannot be built.
    pub fn new(config: PushoverConfig) -> Result<Self, PushoverError> {
        if config.token.trim().is_empty() {
            return Err(PushoverError::MissingToken);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            token: config.token,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            users: config.user_keys,
        })
    }

    /// Build a notifier and keep only the user keys the API authenticates.
    ///
    /// # Errors
    ///
    /// Returns [`PushoverError::InvalidToken`] if the application token is
    /// refused, or a transport error if the API cannot be reached.
    #[tracing::instrument(skip_all, fields(users = config.user_keys.len()))]
    pub async fn connect(config: PushoverConfig) -> Result<Self, PushoverError> {
        let mut notifier = Self::new(config)?;
        let candidates = std::mem::take(&mut notifier.users);

        for user in candidates {
            match notifier.validate_user(&user).await {
                Ok(devices) => {
                    tracing::info!(%user, devices = %devices.join(" "), "added pushover user");
                    notifier.users.push(user);
                }
                Err(PushoverError::Rejected { errors }) => {
                    tracing::warn!(%user, ?errors, "pushover user not authenticated");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(notifier)
    }

    /// User keys messages are sent to.
    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Check a user key, returning the names of the user's devices.
    ///
    /// # Errors
    ///
    /// Returns [`PushoverError::Rejected`] if the key is not valid.
    pub async fn validate_user(&self, user: &str) -> Result<Vec<String>, PushoverError> {
        let form = [("token", self.token.as_str()), ("user", user)];
        let response = self.call(VALIDATE_USER, &form).await?;
        Ok(response.devices)
    }

    /// Send `message` to a single user.
    pub async fn send_to(&self, user: &str, message: &str) -> DeliveryResult {
        let form = [
            ("token", self.token.as_str()),
            ("user", user),
            ("message", message),
        ];
        match self.call(MESSAGES, &form).await {
            Ok(response) => DeliveryResult::delivered(user, response.request),
            Err(err) => DeliveryResult::failed(user, err.to_string()),
        }
    }

    async fn call(&self, path: &str, form: &[(&str, &str)]) -> Result<ApiResponse, PushoverError> {
        let response = self
            .client
            .post(format!("{}{path}", self.api_url))
            .form(form)
            .send()
            .await?;
        let status = response.status();

        match response.json::<ApiResponse>().await {
            Ok(body) if body.status == 1 => Ok(body),
            Ok(body) if body.token.as_deref() == Some("invalid") => {
                Err(PushoverError::InvalidToken)
            }
            Ok(body) => Err(PushoverError::Rejected {
                errors: body.errors,
            }),
            Err(err) if status.is_success() => Err(PushoverError::Http(err)),
            Err(_) => Err(PushoverError::Status(status.as_u16())),
        }
    }
}

impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str) -> Vec<DeliveryResult> {
        tracing::info!(users = self.users.len(), %message, "sending pushover message");
        let mut results = Vec::with_capacity(self.users.len());
        for user in &self.users {
            results.push(self.send_to(user, message).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, users: &[&str]) -> PushoverConfig {
        PushoverConfig {
            api_url: server.uri(),
            ..PushoverConfig::new(
                "app-token",
                users.iter().map(ToString::to_string).collect(),
            )
        }
    }

    fn accepted(request: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "status": 1, "request": request }))
    }

    fn rejected(errors: &[&str]) -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_json(json!({
            "user": "invalid",
            "errors": errors,
            "status": 0,
            "request": "r-err",
        }))
    }

    #[tokio::test]
    async fn should_post_form_fields_and_return_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("token=app-token"))
            .and(body_string_contains("user=alice"))
            .and(body_string_contains("message=hello"))
            .respond_with(accepted("r-1"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(config(&server, &["alice"])).unwrap();
        let results = notifier.notify("hello").await;

        assert_eq!(
            results,
            [DeliveryResult::delivered("alice", Some("r-1".into()))]
        );
    }

    #[tokio::test]
    async fn should_return_one_result_per_user_even_when_one_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("user=bob"))
            .respond_with(rejected(&["user identifier is invalid"]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("user=alice"))
            .respond_with(accepted("r-2"))
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(config(&server, &["bob", "alice"])).unwrap();
        let results = notifier.notify("alarm").await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].recipient, "bob");
        assert!(!results[0].delivered);
        assert_eq!(
            results[0].error.as_deref(),
            Some("request rejected: user identifier is invalid")
        );
        assert!(results[1].delivered);
    }

    #[tokio::test]
    async fn should_report_status_when_body_is_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(config(&server, &["alice"])).unwrap();
        let results = notifier.notify("hello").await;

        assert_eq!(
            results,
            [DeliveryResult::failed("alice", "unexpected HTTP status 503")]
        );
    }

    #[tokio::test]
    async fn should_fail_delivery_when_api_unreachable() {
        let notifier = PushoverNotifier::new(PushoverConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(2),
            ..PushoverConfig::new("app-token", vec!["alice".into()])
        })
        .unwrap();

        let results = notifier.notify("hello").await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].delivered);
    }

    #[tokio::test]
    async fn should_keep_only_authenticated_users_on_connect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/users/validate.json"))
            .and(body_string_contains("user=alice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": 1, "devices": ["phone"], "request": "v-1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/users/validate.json"))
            .and(body_string_contains("user=mallory"))
            .respond_with(rejected(&["user key is invalid"]))
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::connect(config(&server, &["mallory", "alice"]))
            .await
            .unwrap();

        assert_eq!(notifier.users(), ["alice"]);
    }

    #[tokio::test]
    async fn should_refuse_invalid_application_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/users/validate.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "token": "invalid",
                "errors": ["application token is invalid"],
                "status": 0,
                "request": "v-2",
            })))
            .mount(&server)
            .await;

        let result = PushoverNotifier::connect(config(&server, &["alice"])).await;

        assert!(matches!(result, Err(PushoverError::InvalidToken)));
    }

    #[test]
    fn should_require_token() {
        let result = PushoverNotifier::new(PushoverConfig::new("  ", vec!["alice".into()]));
        assert!(matches!(result, Err(PushoverError::MissingToken)));
    }

    #[tokio::test]
    async fn should_send_nothing_without_users() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(accepted("never"))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(config(&server, &[])).unwrap();

        assert!(notifier.notify("hello").await.is_empty());
    }
}
