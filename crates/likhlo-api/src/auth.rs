use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::SaltString,
};
use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use rand_core::OsRng;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use likhlo_types::api::{SignInRequest, SignUpRequest, TokenResponse, UserCountResponse};

use crate::error::ApiError;
use crate::{AppState, run_db, token};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// GET /users
pub async fn count_users(State(state): State<AppState>) -> Result<Json<UserCountResponse>, ApiError> {
    let user_count = run_db(&state, |db| db.count_users()).await?;
    Ok(Json(UserCountResponse { user_count }))
}

/// POST /users/SignUp
pub async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignUpRequest>, ApiError>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Please Enter a valid Email".into()));
    }

    let (email, username) = (req.email.clone(), req.username.clone());
    let existing = run_db(&state, move |db| db.find_user_by_email_or_username(&email, &username)).await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    // A concurrent sign-up can still win the race here; the UNIQUE
    // constraints turn that into a store error.
    let id = user_id.to_string();
    let (email, username) = (req.email.clone(), req.username.clone());
    run_db(&state, move |db| db.create_user(&id, &email, &username, &password_hash)).await?;

    info!("User {} signed up ({})", req.username, user_id);

    let jwt = token::issue(user_id, &state.jwt_secret, state.token_ttl)?;
    Ok(Json(TokenResponse { jwt }))
}

/// POST /users/SignIn
pub async fn sign_in(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignInRequest>, ApiError>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("Please Enter a valid Email id".into()));
    }

    let email = req.email.clone();
    let user = run_db(&state, move |db| db.find_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::InvalidCredentials("No such user exists".into()))?;

    if !verify_password(&req.password, &user.password)? {
        warn!("Failed sign-in for {}", user.id);
        return Err(ApiError::InvalidCredentials("Invalid password".into()));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e))?;

    let jwt = token::issue(user_id, &state.jwt_secret, state.token_ttl)?;
    Ok(Json(TokenResponse { jwt }))
}

/// Hash with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is unreadable: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
