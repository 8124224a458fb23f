use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Note;

// -- JWT Claims --

/// Claims carried by every session token. Shared by the issuer, the
/// authentication middleware and anything else that needs the caller's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub iat: usize,
    pub exp: usize,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    #[serde(rename = "Username", alias = "username")]
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both sign-up and sign-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub jwt: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountResponse {
    pub user_count: u64,
}

// -- Notes --

/// Body of `POST /notes/create`. Missing fields are stored as empty strings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Body of `PUT /notes/{id}`. A field left out keeps its stored value.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotesResponse {
    #[serde(rename = "Notes")]
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub note: Note,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedNoteResponse {
    #[serde(rename = "UpdatedNote")]
    pub updated_note: Note,
}

/// Result of `GET /notes?q=`. Only the most recently updated match is
/// returned, or `null` when nothing matches.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub result: Option<Note>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Plain message body, used for successes without a payload and for every
/// error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}
