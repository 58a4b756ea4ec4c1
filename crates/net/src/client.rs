//! HTTP client for the StaySpot REST service

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use stayspot_core::{
    AuthSession, ConversationSummary, IdentityProvider, ListingSummary, Message, MessageGateway,
    User,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    error_message, ListingRequest, LoginRequest, MessageEnvelope, ProfileResponse,
    RegisterRequest, SendMessageRequest,
};

/// Client handle for the REST API
///
/// Cheap to share behind an `Arc`; the bearer token can be swapped after
/// login without rebuilding the client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::from_reqwest)?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Use a previously stored bearer token
    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String> {
        self.token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .ok_or(Error::NotAuthenticated)
    }

    /// Send a request and decode a JSON success body
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(Error::from_reqwest)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(status = status.as_u16(), %message, "Request failed");
            return Err(Error::from_status(status.as_u16(), message));
        }

        if status == StatusCode::NO_CONTENT {
            return Err(Error::Protocol("empty response body".into()));
        }

        let bytes = response.bytes().await.map_err(Error::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
    }

    /// Sign in and keep the returned token
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let request = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest { email, password });
        let session: AuthSession = self.send_json(request).await?;
        self.set_token(Some(session.token.clone()));
        info!(user_id = session.id, "Logged in");
        Ok(session)
    }

    /// Create an account and keep the returned token
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        let request = self.http.post(self.url("/register")).json(&RegisterRequest {
            name,
            email,
            password,
        });
        let session: AuthSession = self.send_json(request).await?;
        self.set_token(Some(session.token.clone()));
        info!(user_id = session.id, "Registered");
        Ok(session)
    }

    /// Profile of the token holder
    pub async fn fetch_current_user(&self) -> Result<User> {
        let token = self.bearer()?;
        let request = self.http.get(self.url("/api/user")).bearer_auth(token);
        let response: ProfileResponse = self.send_json(request).await?;
        response
            .into_user()
            .ok_or_else(|| Error::Protocol("profile response contained no user".into()))
    }

    /// Conversations the token holder takes part in
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let token = self.bearer()?;
        let request = self
            .http
            .get(self.url("/api/conversations"))
            .bearer_auth(token);
        self.send_json(request).await
    }

    /// Full message log of a conversation
    pub async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let token = self.bearer()?;
        let request = self
            .http
            .get(self.url(&format!("/api/conversations/{conversation_id}/messages")))
            .bearer_auth(token);
        let messages: Vec<Message> = self.send_json(request).await?;
        debug!(conversation_id, count = messages.len(), "Fetched messages");
        Ok(messages)
    }

    /// Post a message; empty content never leaves the client
    pub async fn post_message(&self, conversation_id: i64, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyContent);
        }

        let token = self.bearer()?;
        let request = self
            .http
            .post(self.url(&format!("/api/conversations/{conversation_id}/messages")))
            .bearer_auth(token)
            .json(&SendMessageRequest { content });
        let envelope: MessageEnvelope = self.send_json(request).await?;
        let message = envelope.into_message();
        debug!(conversation_id, message_id = message.id, "Message posted");
        Ok(message)
    }

    /// Listing a conversation is about
    pub async fn fetch_listing(&self, rental_id: i64) -> Result<ListingSummary> {
        let request = self
            .http
            .post(self.url("/api/rental-details"))
            .json(&ListingRequest {
                rental_id: rental_id.to_string(),
            });
        self.send_json(request).await
    }
}

#[async_trait]
impl MessageGateway for ApiClient {
    async fn list_messages(&self, conversation_id: i64) -> stayspot_core::Result<Vec<Message>> {
        Ok(self.fetch_messages(conversation_id).await?)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> stayspot_core::Result<Message> {
        Ok(self.post_message(conversation_id, content).await?)
    }
}

#[async_trait]
impl IdentityProvider for ApiClient {
    async fn current_user(&self) -> stayspot_core::Result<User> {
        Ok(self.fetch_current_user().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stayspot_core::ReadState;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(2))
            .unwrap()
            .with_token(Some("tok".to_string()))
    }

    fn message_json(id: i64, sender_id: i64, ts: &str) -> serde_json::Value {
        json!({
            "id": id,
            "conversation_id": 7,
            "sender_id": sender_id,
            "content": format!("message {id}"),
            "timestamp": ts,
            "is_read": false
        })
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            ApiClient::new("stayspot.local", Duration::from_secs(1)),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_messages_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/7/messages"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                message_json(1, 3, "2024-01-01T10:00:00.000Z"),
                message_json(2, 4, "2024-01-01T14:30:00.000Z"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let messages = client.list_messages(7).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender_id, 4);
        assert_eq!(messages[0].read_state, ReadState::Unread);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/7/messages"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.list_messages(7).await.unwrap_err();
        assert!(matches!(err, stayspot_core::Error::Auth(ref m) if m == "Invalid token"));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/7/messages"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.list_messages(7).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_timeout_maps_to_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/7/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_millis(50))
            .unwrap()
            .with_token(Some("tok".to_string()));
        let err = client.fetch_messages(7).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn test_garbage_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversations/7/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_messages(7).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_no_token_is_not_authenticated() {
        let server = MockServer::start().await;
        let client = ApiClient::new(&server.uri(), Duration::from_secs(1)).unwrap();

        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, stayspot_core::Error::NotAuthenticated));

        let err = client.list_messages(1).await.unwrap_err();
        assert!(matches!(err, stayspot_core::Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_append_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversations/7/messages"))
            .and(header("Authorization", "Bearer tok"))
            .and(body_json(json!({"content": "Is it furnished?"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(message_json(10, 3, "2024-01-02T09:00:00.000Z")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let message = client
            .append_message(7, "  Is it furnished?  ")
            .await
            .unwrap();
        assert_eq!(message.id, 10);
    }

    #[tokio::test]
    async fn test_append_empty_never_hits_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.append_message(7, "   ").await.unwrap_err();
        assert!(matches!(err, stayspot_core::Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_current_user_unwraps_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 3, "name": "Asha", "email": "asha@example.com", "created_at": "2023-11-02T08:15:00.000Z"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let user = client.current_user().await.unwrap();
        assert_eq!(user.id, 3);
    }

    #[tokio::test]
    async fn test_login_keeps_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"email": "asha@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "name": "Asha", "email": "asha@example.com", "token": "fresh"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 11, "rental_id": 42, "rental_title": "2BHK near Lake",
                "owner_id": 1, "owner_name": "Meera", "user_id": 3, "user_name": "Asha",
                "last_message": "See you", "last_message_time": "2024-01-01T10:00:00.000Z"
            }])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        assert!(!client.has_token());

        let session = client.login("asha@example.com", "pw").await.unwrap();
        assert_eq!(session.token, "fresh");
        assert!(client.has_token());

        let conversations = client.list_conversations().await.unwrap();
        assert_eq!(conversations[0].counterpart_name(Some(3)), "Meera");
    }

    #[tokio::test]
    async fn test_login_failure_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = client.login("a@b.c", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized { status: 401, .. }));
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rental-details"))
            .and(body_json(json!({"rental_id": "42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42, "title": "2BHK near Lake", "location": "Pune",
                "price": "12500.00", "imageUrl": "https://img.example/42.jpg"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let listing = client.fetch_listing(42).await.unwrap();
        assert_eq!(listing.title, "2BHK near Lake");
        assert_eq!(listing.price_label().as_deref(), Some("₹12,500/month"));
    }
}
