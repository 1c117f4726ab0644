//! Task collection and detail handlers.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use taskdeck_core::db::query::{self, SortOrder, TaskFilter};
use taskdeck_core::service::{self, NewTask, TaskPatch};
use taskdeck_core::{Error, validate};

use super::error_response;
use crate::app_state::AppState;
use crate::pagination::{self, Page};

/// A tag specification: either a bare name or a `{"name": ...}` record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagSpec {
    Name(String),
    Record { name: String },
}

impl TagSpec {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Record { name } => name,
        }
    }
}

/// Distinguishes a field provided as `null` (clears the value) from a field
/// that is absent from the body (leaves it unchanged).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    assigned_to: Option<i64>,
    #[serde(default)]
    tags: Vec<TagSpec>,
}

impl CreateTaskBody {
    fn into_new_task(self) -> Result<NewTask, Error> {
        let status = self
            .status
            .as_deref()
            .map(validate::parse_status)
            .transpose()?
            .unwrap_or_default();
        let priority = self
            .priority
            .as_deref()
            .map(validate::parse_priority)
            .transpose()?
            .unwrap_or_default();
        let due_date = self
            .due_date
            .as_deref()
            .map(validate::parse_timestamp)
            .transpose()?;

        Ok(NewTask {
            title: self.title,
            description: self.description.unwrap_or_default(),
            status,
            priority,
            due_date,
            assigned_to: self.assigned_to,
            tags: self.tags.into_iter().map(TagSpec::into_name).collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchTaskBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    assigned_to: Option<Option<i64>>,
    #[serde(default)]
    tags: Option<Vec<TagSpec>>,
}

impl PatchTaskBody {
    fn into_patch(self) -> Result<TaskPatch, Error> {
        let status = self
            .status
            .as_deref()
            .map(validate::parse_status)
            .transpose()?;
        let priority = self
            .priority
            .as_deref()
            .map(validate::parse_priority)
            .transpose()?;
        let due_date = match self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(ref raw)) => Some(Some(validate::parse_timestamp(raw)?)),
        };

        Ok(TaskPatch {
            title: self.title,
            description: self.description,
            status,
            priority,
            due_date,
            assigned_to: self.assigned_to,
            tags: self
                .tags
                .map(|specs| specs.into_iter().map(TagSpec::into_name).collect()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    priority: Option<String>,
    assigned_to: Option<String>,
    tag: Option<String>,
    due_date_start: Option<String>,
    due_date_end: Option<String>,
    ordering: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl ListParams {
    fn into_filter(self) -> Result<(TaskFilter, u32, u32), Error> {
        let sort = self
            .ordering
            .as_deref()
            .map(SortOrder::from_str)
            .transpose()?
            .unwrap_or_default();
        let due_after = self
            .due_date_start
            .as_deref()
            .map(validate::parse_timestamp)
            .transpose()?;
        let due_before = self
            .due_date_end
            .as_deref()
            .map(validate::parse_timestamp)
            .transpose()?;

        let page = pagination::page_number(self.page);
        let page_size = pagination::clamp_page_size(self.page_size);

        let filter = TaskFilter {
            status: self.status,
            priority: self.priority,
            assigned_to: self.assigned_to,
            tag: self.tag,
            due_after,
            due_before,
            limit: Some(page_size),
            offset: Some(pagination::offset(page, page_size)),
            sort,
        };

        Ok((filter, page, page_size))
    }
}

pub async fn list(state: web::Data<AppState>, params: web::Query<ListParams>) -> HttpResponse {
    let (filter, page, page_size) = match params.into_inner().into_filter() {
        Ok(parts) => parts,
        Err(e) => return error_response(&e),
    };

    let conn = state.conn();
    let count = match query::count_tasks(&conn, &filter) {
        Ok(count) => count,
        Err(e) => return error_response(&e),
    };
    match query::list_tasks(&conn, &filter) {
        Ok(results) => HttpResponse::Ok().json(Page::new(count, page, page_size, results)),
        Err(e) => error_response(&e),
    }
}

pub async fn create(state: web::Data<AppState>, body: web::Json<CreateTaskBody>) -> HttpResponse {
    let input = match body.into_inner().into_new_task() {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };

    let mut conn = state.conn();
    match service::create_task(&mut conn, &input) {
        Ok(task) => HttpResponse::Created().json(task),
        Err(e) => error_response(&e),
    }
}

pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let task_id = path.into_inner();
    let conn = state.conn();
    match query::get_task(&conn, task_id) {
        Ok(Some(task)) => HttpResponse::Ok().json(task),
        Ok(None) => error_response(&Error::NotFound {
            entity: "task",
            id: task_id.to_string(),
        }),
        Err(e) => error_response(&e),
    }
}

pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PatchTaskBody>,
) -> HttpResponse {
    let task_id = path.into_inner();
    let patch = match body.into_inner().into_patch() {
        Ok(patch) => patch,
        Err(e) => return error_response(&e),
    };

    let mut conn = state.conn();
    match service::update_task(&mut conn, task_id, &patch) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => error_response(&e),
    }
}

pub async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let task_id = path.into_inner();
    let conn = state.conn();
    match service::delete_task(&conn, task_id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}
