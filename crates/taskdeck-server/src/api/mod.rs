//! Route registration and error-to-status mapping.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use taskdeck_core::Error;

mod tags;
mod tasks;
mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/tasks")
                    .route(web::get().to(tasks::list))
                    .route(web::post().to(tasks::create)),
            )
            .service(
                web::resource("/tasks/{id}")
                    .route(web::get().to(tasks::get))
                    .route(web::patch().to(tasks::update))
                    .route(web::put().to(tasks::update))
                    .route(web::delete().to(tasks::delete)),
            )
            .service(web::resource("/tags").route(web::get().to(tags::list)))
            .service(
                web::resource("/tags/{id}")
                    .route(web::get().to(tags::get))
                    .route(web::delete().to(tags::delete)),
            )
            .service(web::resource("/users").route(web::post().to(users::create)))
            .service(web::resource("/users/{id}").route(web::delete().to(users::delete))),
    );
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

/// Map a core error onto its HTTP representation.
///
/// Storage failures are logged and reported opaquely; SQLite error text
/// never reaches a response body.
pub(crate) fn error_response(err: &Error) -> HttpResponse {
    match err {
        Error::Validation { .. } => HttpResponse::BadRequest().json(Detail {
            detail: err.to_string(),
        }),
        Error::NotFound { .. } => HttpResponse::NotFound().json(Detail {
            detail: err.to_string(),
        }),
        Error::Storage(source) => {
            tracing::error!(%source, "storage failure");
            HttpResponse::InternalServerError().json(Detail {
                detail: "storage failure".to_string(),
            })
        }
    }
}
