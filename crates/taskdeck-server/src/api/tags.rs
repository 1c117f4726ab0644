//! Tag collection and detail handlers.
//!
//! Tags are created implicitly by the write service's resolver; this surface
//! only reads and explicitly removes them.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use taskdeck_core::db::query;
use taskdeck_core::{Error, service};

use super::error_response;
use crate::app_state::AppState;
use crate::pagination::{self, Page};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn list(state: web::Data<AppState>, params: web::Query<ListParams>) -> HttpResponse {
    let page = pagination::page_number(params.page);
    let page_size = pagination::clamp_page_size(params.page_size);

    let conn = state.conn();
    let count = match query::count_tags(&conn) {
        Ok(count) => count,
        Err(e) => return error_response(&e),
    };
    match query::list_tags(
        &conn,
        Some(page_size),
        Some(pagination::offset(page, page_size)),
    ) {
        Ok(results) => HttpResponse::Ok().json(Page::new(count, page, page_size, results)),
        Err(e) => error_response(&e),
    }
}

pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let tag_id = path.into_inner();
    let conn = state.conn();
    match query::get_tag(&conn, tag_id) {
        Ok(Some(tag)) => HttpResponse::Ok().json(tag),
        Ok(None) => error_response(&Error::NotFound {
            entity: "tag",
            id: tag_id.to_string(),
        }),
        Err(e) => error_response(&e),
    }
}

pub async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let tag_id = path.into_inner();
    let conn = state.conn();
    match service::delete_tag(&conn, tag_id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}
