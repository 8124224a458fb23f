//! Typed HTTP client for the Likhlo notes API.
//!
//! Responses are decoded straight into the `likhlo-types` wire structs, and
//! error bodies are always `{"msg": ...}`, so callers never inspect raw text.
//! The caller builds a `NotesClient` explicitly and passes it to whatever
//! needs it; there is no process-wide instance.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use likhlo_types::api::{
    CreateNoteRequest, MessageResponse, NoteResponse, NotesResponse, SearchResponse, SignInRequest,
    SignUpRequest, TokenResponse, UpdateNoteRequest, UpdatedNoteResponse, UserCountResponse,
};
use likhlo_types::models::Note;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{status}: {msg}")]
    Api { status: StatusCode, msg: String },

    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(e) => e.status(),
            Self::Api { status, .. } => Some(*status),
            Self::NotSignedIn => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct NotesClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl NotesClient {
    /// `base_url` is the server origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }

    // -- Users --

    pub async fn user_count(&self) -> Result<u64> {
        let resp: UserCountResponse = self.send(self.request(Method::GET, "/users")).await?;
        Ok(resp.user_count)
    }

    /// Registers and keeps the returned token for later calls.
    pub async fn sign_up(&mut self, username: &str, email: &str, password: &str) -> Result<String> {
        let body = SignUpRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: TokenResponse = self
            .send(self.request(Method::POST, "/users/SignUp").json(&body))
            .await?;
        self.token = Some(resp.jwt.clone());
        Ok(resp.jwt)
    }

    /// Signs in and keeps the returned token for later calls.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<String> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: TokenResponse = self
            .send(self.request(Method::POST, "/users/SignIn").json(&body))
            .await?;
        self.token = Some(resp.jwt.clone());
        Ok(resp.jwt)
    }

    // -- Notes --

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let resp: NotesResponse = self.send(self.authed(Method::GET, "/notes/all")?).await?;
        Ok(resp.notes)
    }

    pub async fn get_note(&self, id: Uuid) -> Result<Note> {
        let resp: NoteResponse = self
            .send(self.authed(Method::GET, &format!("/notes/{}", id))?)
            .await?;
        Ok(resp.note)
    }

    pub async fn create_note(&self, title: &str, content: &str) -> Result<Note> {
        let body = CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        let resp: NoteResponse = self
            .send(self.authed(Method::POST, "/notes/create")?.json(&body))
            .await?;
        Ok(resp.note)
    }

    pub async fn update_note(&self, id: Uuid, changes: &UpdateNoteRequest) -> Result<Note> {
        let resp: UpdatedNoteResponse = self
            .send(self.authed(Method::PUT, &format!("/notes/{}", id))?.json(changes))
            .await?;
        Ok(resp.updated_note)
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<()> {
        let _: MessageResponse = self
            .send(self.authed(Method::DELETE, &format!("/notes/{}", id))?)
            .await?;
        Ok(())
    }

    /// Most recently updated note matching `query`, if any.
    pub async fn search(&self, query: &str) -> Result<Option<Note>> {
        let resp: SearchResponse = self
            .send(self.authed(Method::GET, "/notes")?.query(&[("q", query)]))
            .await?;
        Ok(resp.result)
    }

    // -- Plumbing --

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/api/v1{}", self.base_url, path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let msg = match resp.json::<MessageResponse>().await {
        Ok(body) => body.msg,
        Err(e) => {
            debug!("Error response without a message body: {}", e);
            status.canonical_reason().unwrap_or("unknown error").to_string()
        }
    };
    Err(ClientError::Api { status, msg })
}
