use std::future::Future;
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use url::Url;

use crate::api::models::{list_field, Conversation, Message, SendRequest, SendResponse};
use crate::error::ApiError;

/// The three calls the chat view makes against the messaging endpoint.
pub trait MessagingBackend: Send + Sync {
    fn list_chats(&self, user_id: i64) -> impl Future<Output = Result<Vec<Conversation>, ApiError>> + Send;
    fn list_messages(&self, chat_id: i64) -> impl Future<Output = Result<Vec<Message>, ApiError>> + Send;
    fn send_message(&self, request: &SendRequest) -> impl Future<Output = Result<SendResponse, ApiError>> + Send;
}

pub struct ApiClient {
    pub http: HttpClient,
    endpoint: Url,
}

impl ApiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint.trim())?;
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn action_url(&self, action: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", action);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    pub fn chats_url(&self, user_id: i64) -> Url {
        self.action_url("list", &[("userId", user_id.to_string())])
    }

    pub fn messages_url(&self, chat_id: i64) -> Url {
        self.action_url("messages", &[("chatId", chat_id.to_string())])
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        let text = resp.text().await?;
        parse_body(status, &text)
    }
}

/// Error statuses win over the body; a success body must be JSON.
fn parse_body(status: StatusCode, text: &str) -> Result<Value, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(serde_json::from_str(text)?)
}

impl MessagingBackend for ApiClient {
    /// Chats of `user_id`, most recent activity first (server order).
    async fn list_chats(&self, user_id: i64) -> Result<Vec<Conversation>, ApiError> {
        let resp = self.http.get(self.chats_url(user_id)).send().await?;
        let json = Self::read_json(resp).await?;
        Ok(list_field(&json, "chats"))
    }

    async fn list_messages(&self, chat_id: i64) -> Result<Vec<Message>, ApiError> {
        let resp = self.http.get(self.messages_url(chat_id)).send().await?;
        let json = Self::read_json(resp).await?;
        Ok(list_field(&json, "messages"))
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SendResponse, ApiError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&request.body())
            .send()
            .await?;
        let json = Self::read_json(resp).await?;
        Ok(serde_json::from_value(json)?)
    }
}
