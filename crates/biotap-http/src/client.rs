//! reqwest-backed [`LinkApi`]

use async_trait::async_trait;
use http::{Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use biotap_core::{
    AnalyticsResponse, GeographicResponse, Link, LinkApi, LinkCreate, LinkUpdate,
    MessageResponse, PasswordChange, PasswordResetConfirm, PasswordResetRequest, Result,
    SyncError, Token, User, UserRegister, UserUpdate,
};

use crate::{ApiConfig, ApiSession, Endpoints};

/// Retry-After assumed when a 429 response carries none
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the biotap REST API
///
/// Every request carries the session's token as a `Bearer` header. A 401
/// response signs the session out.
#[derive(Debug, Clone)]
pub struct HttpLinkApi {
    endpoints: Endpoints,
    session: ApiSession,
    http_client: reqwest::Client,
}

impl HttpLinkApi {
    /// Create a client for `config`, sharing `session`
    pub fn new(config: ApiConfig, session: ApiSession) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            endpoints: Endpoints::new(config.base_url),
            session,
            http_client,
        })
    }

    /// Create a client configured from the environment
    pub fn from_env(session: ApiSession) -> Result<Self> {
        Self::new(ApiConfig::from_env()?, session)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    /// Exchange credentials for a token and store it in the session
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let url = self.endpoints.login();
        let resp = self
            .http_client
            .post(url.clone())
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| transport_error(&Method::POST, &url, e))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SyncError::RateLimited {
                retry_after_secs: retry_after(&resp),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: format!("login failed: {}", error_message(&body, status)),
            });
        }

        let token: Token = resp
            .json()
            .await
            .map_err(|e| SyncError::Deserialization(e.to_string()))?;
        self.session.set_token(token.access_token.clone());
        debug!(target: "biotap", username, "logged in");
        Ok(token)
    }

    /// Create an account without signing in
    pub async fn register(&self, user: &UserRegister) -> Result<User> {
        self.send_json(Method::POST, self.endpoints.register(), user).await
    }

    /// Email a password reset token to `email`
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        self.send_json(Method::POST, self.endpoints.password_reset_request(), &body)
            .await
    }

    /// Set a new password with an emailed reset token
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        let body = PasswordResetConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_json(Method::POST, self.endpoints.password_reset_confirm(), &body)
            .await
    }

    /// The signed-in user
    pub async fn current_user(&self) -> Result<User> {
        self.get_json(self.endpoints.current_user()).await
    }

    pub async fn update_user(&self, update: &UserUpdate) -> Result<User> {
        self.send_json(Method::PATCH, self.endpoints.current_user(), update)
            .await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<MessageResponse> {
        self.send_json(Method::POST, self.endpoints.change_password(), change)
            .await
    }

    /// Delete the signed-in account and sign the session out
    pub async fn delete_account(&self) -> Result<()> {
        self.send(Method::DELETE, self.endpoints.current_user(), None::<&()>)
            .await?;
        self.session.clear();
        debug!(target: "biotap", "account deleted");
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let resp = self.send(Method::GET, url, None::<&()>).await?;
        decode(resp).await
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.send(method, url, Some(body)).await?;
        decode(resp).await
    }

    /// Issue a request and map non-success statuses to errors
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let mut req = self.http_client.request(method.clone(), url.clone());
        if let Some(token) = self.session.bearer() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| transport_error(&method, &url, e))?;

        let status = resp.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(SyncError::RateLimited {
                retry_after_secs: retry_after(&resp),
            }),
            StatusCode::UNAUTHORIZED => {
                warn!(target: "biotap", %method, url = url.path(), "token rejected, signing out");
                self.session.clear();
                Err(SyncError::Unauthorized)
            }
            code if !code.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                Err(SyncError::Api {
                    status: code.as_u16(),
                    message: error_message(&body, code),
                })
            }
            _ => Ok(resp),
        }
    }
}

#[async_trait]
impl LinkApi for HttpLinkApi {
    async fn get_links(&self) -> Result<Vec<Link>> {
        self.get_json(self.endpoints.links()).await
    }

    async fn get_public_links(&self, username: &str) -> Result<Vec<Link>> {
        self.get_json(self.endpoints.public_links(username)).await
    }

    async fn get_analytics(&self, days: u32) -> Result<AnalyticsResponse> {
        self.get_json(self.endpoints.analytics(days)).await
    }

    async fn get_geographic_analytics(&self, days: u32) -> Result<GeographicResponse> {
        self.get_json(self.endpoints.geographic(days)).await
    }

    async fn create_link(&self, link: &LinkCreate) -> Result<Link> {
        self.send_json(Method::POST, self.endpoints.links(), link).await
    }

    async fn update_link(&self, id: i64, update: &LinkUpdate) -> Result<Link> {
        self.send_json(Method::PATCH, self.endpoints.link(id), update)
            .await
    }

    async fn delete_link(&self, id: i64) -> Result<()> {
        // Body is ignored; the API may answer with no content
        self.send(Method::DELETE, self.endpoints.link(id), None::<&()>)
            .await?;
        Ok(())
    }

    async fn refresh_link_stats(&self, id: i64) -> Result<Link> {
        self.get_json(self.endpoints.link_stats(id)).await
    }

    fn redirect_url(&self, link_id: i64) -> String {
        self.endpoints.redirect(link_id).to_string()
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    resp.json()
        .await
        .map_err(|e| SyncError::Deserialization(e.to_string()))
}

fn transport_error(method: &Method, url: &Url, source: reqwest::Error) -> SyncError {
    debug!(target: "biotap", %method, url = url.path(), error = %source, "request failed");
    if source.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Network(format!("failed to send {} {}: {}", method, url.path(), source))
    }
}

fn retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Message of an error response: `detail` or `message` from a JSON body,
/// else the raw body, else the status
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        for field in ["detail", "message"] {
            if let Some(serde_json::Value::String(message)) = fields.get(field) {
                return message.clone();
            }
        }
    }
    if body.trim().is_empty() {
        format!("API Error: {}", status.as_u16())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn link_json(id: i64, clicks: u64) -> String {
        format!(
            r#"{{"id":{id},"title":"Blog","url":"https://example.com","is_active":true,"display_order":0,"click_count":{clicks},"created_at":"2024-01-01T00:00:00","user_id":7}}"#
        )
    }

    fn client(server: &Server, session: ApiSession) -> HttpLinkApi {
        HttpLinkApi::new(ApiConfig::new(&server.url()).unwrap(), session).unwrap()
    }

    #[test]
    fn test_error_message_sources() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(r#"{"detail":"Link not found"}"#, status), "Link not found");
        assert_eq!(error_message(r#"{"message":"nope"}"#, status), "nope");
        assert_eq!(error_message("plain failure", status), "plain failure");
        assert_eq!(error_message("", status), "API Error: 400");
        // Validation errors carry a list in `detail`
        assert_eq!(
            error_message(r#"{"detail":[{"loc":["body"]}]}"#, status),
            r#"{"detail":[{"loc":["body"]}]}"#
        );
    }

    #[tokio::test]
    async fn test_get_links_sends_bearer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/links/")
            .match_header("authorization", "Bearer tkn")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", link_json(42, 5)))
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        let links = api.get_links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].click_count, 5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_public_links_without_session() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/links/public/alice")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = client(&server, ApiSession::new());
        assert!(api.get_public_links("alice").await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_analytics_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/analytics/")
            .match_query(Matcher::UrlEncoded("days".into(), "7".into()))
            .with_status(200)
            .with_body(
                r#"{"total_clicks":3,"unique_visitors":2,"daily_stats":[],"top_links":[],"device_stats":[],"growth_percentage":0.0}"#,
            )
            .create_async()
            .await;

        let api = client(&server, ApiSession::new());
        assert_eq!(api.get_analytics(7).await.unwrap().total_clicks, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me")
            .with_status(401)
            .with_body(r#"{"detail":"Could not validate credentials"}"#)
            .create_async()
            .await;

        let session = ApiSession::with_token("expired");
        let api = client(&server, session.clone());
        assert_eq!(api.current_user().await, Err(SyncError::Unauthorized));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let mut server = Server::new_async().await;
        let _limited = server
            .mock("GET", "/links/")
            .with_status(429)
            .with_header("retry-after", "17")
            .create_async()
            .await;
        let _default = server
            .mock("GET", "/links/public/bob")
            .with_status(429)
            .create_async()
            .await;

        let api = client(&server, ApiSession::new());
        assert_eq!(
            api.get_links().await,
            Err(SyncError::RateLimited { retry_after_secs: 17 })
        );
        assert_eq!(
            api.get_public_links("bob").await,
            Err(SyncError::RateLimited {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS
            })
        );
    }

    #[tokio::test]
    async fn test_api_error_uses_detail() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/links/9")
            .with_status(404)
            .with_body(r#"{"detail":"Link not found"}"#)
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        let result = api.update_link(9, &LinkUpdate::active(false)).await;
        assert_eq!(
            result,
            Err(SyncError::Api {
                status: 404,
                message: "Link not found".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_update_sends_partial_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/links/42")
            .match_body(Matcher::Json(serde_json::json!({ "display_order": 3 })))
            .with_status(200)
            .with_body(link_json(42, 0))
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        let link = api.update_link(42, &LinkUpdate::display_order(3)).await.unwrap();
        assert_eq!(link.id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/links/42")
            .with_status(204)
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        api.delete_link(42).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "alice".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","token_type":"bearer"}"#)
            .create_async()
            .await;

        let session = ApiSession::new();
        let api = client(&server, session.clone());
        let token = api.login("alice", "hunter2").await.unwrap();
        assert_eq!(token.access_token, "fresh");
        assert!(session.is_authenticated());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_failure_keeps_session_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(400)
            .with_body(r#"{"detail":"Incorrect username or password"}"#)
            .create_async()
            .await;

        let session = ApiSession::new();
        let api = client(&server, session.clone());
        let result = api.login("alice", "wrong").await;
        assert!(matches!(
            result,
            Err(SyncError::Api { status: 400, ref message }) if message.contains("Incorrect")
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_posts_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/register")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2",
            })))
            .with_status(201)
            .with_body(
                r#"{"id":7,"username":"alice","email":"alice@example.com","is_active":true,"created_at":"2024-01-01T00:00:00"}"#,
            )
            .create_async()
            .await;

        let session = ApiSession::new();
        let api = client(&server, session.clone());
        let user = api
            .register(&UserRegister {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "hunter2".to_string(),
                full_name: None,
            })
            .await
            .unwrap();
        assert_eq!(user.id, 7);
        assert!(!session.is_authenticated());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let mut server = Server::new_async().await;
        let request = server
            .mock("POST", "/auth/password-reset/request")
            .match_body(Matcher::Json(serde_json::json!({ "email": "alice@example.com" })))
            .with_status(200)
            .with_body(r#"{"message":"Reset email sent"}"#)
            .create_async()
            .await;
        let confirm = server
            .mock("POST", "/auth/password-reset/confirm")
            .match_body(Matcher::Json(
                serde_json::json!({ "token": "abc", "new_password": "correct horse" }),
            ))
            .with_status(200)
            .with_body(r#"{"message":"Password updated"}"#)
            .create_async()
            .await;

        let api = client(&server, ApiSession::new());
        let sent = api.request_password_reset("alice@example.com").await.unwrap();
        assert_eq!(sent.message, "Reset email sent");
        let done = api.confirm_password_reset("abc", "correct horse").await.unwrap();
        assert_eq!(done.message, "Password updated");
        request.assert_async().await;
        confirm.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_user_and_change_password() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("PATCH", "/users/me")
            .match_header("authorization", "Bearer tkn")
            .match_body(Matcher::Json(serde_json::json!({ "full_name": "Alice A." })))
            .with_status(200)
            .with_body(
                r#"{"id":7,"username":"alice","email":"alice@example.com","full_name":"Alice A.","is_active":true,"created_at":"2024-01-01T00:00:00"}"#,
            )
            .create_async()
            .await;
        let change = server
            .mock("POST", "/users/change-password")
            .match_header("authorization", "Bearer tkn")
            .with_status(400)
            .with_body(r#"{"detail":"Incorrect current password"}"#)
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        let user = api
            .update_user(&UserUpdate {
                full_name: Some("Alice A.".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Alice A."));

        let result = api
            .change_password(&PasswordChange {
                current_password: "wrong".to_string(),
                new_password: "correct horse".to_string(),
            })
            .await;
        assert_eq!(
            result,
            Err(SyncError::Api {
                status: 400,
                message: "Incorrect current password".to_string()
            })
        );
        update.assert_async().await;
        change.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_account_signs_out() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/users/me")
            .match_header("authorization", "Bearer tkn")
            .with_status(204)
            .create_async()
            .await;

        let session = ApiSession::with_token("tkn");
        let api = client(&server, session.clone());
        api.delete_account().await.unwrap();
        assert!(!session.is_authenticated());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_link_stats() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/links/42/stats")
            .with_status(200)
            .with_body(link_json(42, 11))
            .create_async()
            .await;

        let api = client(&server, ApiSession::with_token("tkn"));
        assert_eq!(api.refresh_link_stats(42).await.unwrap().click_count, 11);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let api = HttpLinkApi::new(ApiConfig::new("http://127.0.0.1:9").unwrap(), ApiSession::new())
            .unwrap();
        assert!(matches!(api.get_links().await, Err(SyncError::Network(_))));
    }

    #[test]
    fn test_redirect_url() {
        let api = HttpLinkApi::new(
            ApiConfig::new("https://api.example.com").unwrap(),
            ApiSession::new(),
        )
        .unwrap();
        assert_eq!(api.redirect_url(42), "https://api.example.com/links/42/redirect");
    }
}
