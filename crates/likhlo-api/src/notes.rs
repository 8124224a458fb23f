use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use likhlo_db::models::NoteRow;
use likhlo_types::api::{
    Claims, CreateNoteRequest, MessageResponse, NoteResponse, NotesResponse, SearchQuery,
    SearchResponse, UpdateNoteRequest, UpdatedNoteResponse,
};
use likhlo_types::models::Note;

use crate::error::ApiError;
use crate::{AppState, run_db};

const NOT_FOUND: &str = "Note not found";
const MISSING: &str = "Note Doesn't exist";

/// GET /notes/all
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<NotesResponse>, ApiError> {
    let owner = claims.id.to_string();
    let rows = run_db(&state, move |db| db.list_notes(&owner)).await?;

    let notes = rows
        .into_iter()
        .map(note_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(NotesResponse { notes }))
}

/// GET /notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = parse_note_id(&id, NOT_FOUND)?;
    let owner = claims.id.to_string();

    let row = run_db(&state, move |db| db.get_note(&id, &owner))
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;

    Ok(Json(NoteResponse {
        note: note_from_row(row)?,
    }))
}

/// POST /notes/create
///
/// Title and content are stored as given; empty strings are fine.
pub async fn create_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateNoteRequest>, ApiError>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note_id = Uuid::new_v4();
    let id = note_id.to_string();
    let owner = claims.id.to_string();

    let row = run_db(&state, move |db| db.create_note(&id, &owner, &req.title, &req.content)).await?;

    info!("Note {} created by {}", note_id, claims.id);

    Ok(Json(NoteResponse {
        note: note_from_row(row)?,
    }))
}

/// PUT /notes/{id}
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateNoteRequest>, ApiError>,
) -> Result<Json<UpdatedNoteResponse>, ApiError> {
    let id = parse_note_id(&id, MISSING)?;
    let owner = claims.id.to_string();

    let row = run_db(&state, move |db| {
        db.update_note(&id, &owner, req.title.as_deref(), req.content.as_deref())
    })
    .await?
    .ok_or_else(|| ApiError::NotFound(MISSING.into()))?;

    Ok(Json(UpdatedNoteResponse {
        updated_note: note_from_row(row)?,
    }))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_note_id(&id, MISSING)?;
    let owner = claims.id.to_string();

    let note_id = id.clone();
    let removed = run_db(&state, move |db| db.delete_note(&note_id, &owner)).await?;
    if !removed {
        return Err(ApiError::NotFound(MISSING.into()));
    }

    info!("Note {} deleted by {}", id, claims.id);

    Ok(Json(MessageResponse {
        msg: "Note deleted Successfully".into(),
    }))
}

/// GET /notes?q=
///
/// Returns the single most recently updated note whose title or content
/// contains `q`, or `null`. Blank queries never reach the store.
pub async fn search_notes(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Search Query Empty".into()))?;
    let owner = claims.id.to_string();

    let row = run_db(&state, move |db| db.search_first_note(&owner, &q)).await?;

    Ok(Json(SearchResponse {
        result: row.map(note_from_row).transpose()?,
    }))
}

/// Canonicalize a path id. Anything that is not a UUID cannot name a note,
/// so it is reported the same way as an absent one.
fn parse_note_id(raw: &str, missing: &str) -> Result<String, ApiError> {
    raw.parse::<Uuid>()
        .map(|id| id.to_string())
        .map_err(|_| ApiError::NotFound(missing.into()))
}

fn note_from_row(row: NoteRow) -> anyhow::Result<Note> {
    Ok(Note {
        id: parse_uuid(&row.id, "id", &row.id)?,
        title: row.title,
        content: row.content,
        user_id: parse_uuid(&row.user_id, "user_id", &row.id)?,
        created_at: parse_timestamp(&row.created_at, "created_at", &row.id)?,
        updated_at: parse_timestamp(&row.updated_at, "updated_at", &row.id)?,
    })
}

fn parse_uuid(value: &str, column: &str, note_id: &str) -> anyhow::Result<Uuid> {
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt {} '{}' on note '{}': {}", column, value, note_id, e))
}

fn parse_timestamp(value: &str, column: &str, note_id: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Corrupt {} '{}' on note '{}': {}", column, value, note_id, e))
}
