//! Minimal identity endpoints.
//!
//! Just enough surface to exercise assignment semantics; anything resembling
//! real identity management belongs to an external provider.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use taskdeck_core::{service, validate};

use super::error_response;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    username: String,
}

pub async fn create(state: web::Data<AppState>, body: web::Json<CreateUserBody>) -> HttpResponse {
    let username = body.username.trim();
    if let Err(e) = validate::check_non_blank("username", username) {
        return error_response(&e);
    }

    // No existence pre-read: the UNIQUE constraint decides, so two racing
    // creators both get a coherent answer.
    let conn = state.conn();
    match service::create_user(&conn, username) {
        Ok(user) => HttpResponse::Created().json(user),
        Err(e) => error_response(&e),
    }
}

pub async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let user_id = path.into_inner();
    let conn = state.conn();
    match service::delete_user(&conn, user_id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}
