use crate::api::AppState;
use crate::error::StoreError;
use crate::model::subject::Subject;
use crate::store::{IdentityStore, RecordStore};
use crate::utils::card_filter;
use crate::utils::identity_cache;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RegisterSubject {
    #[schema(example = "04A1B2C3", value_type = String)]
    pub card_token: String,
    #[schema(example = "John Doe", value_type = String)]
    pub display_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubjectQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectListResponse {
    pub data: Vec<Subject>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Register a badge
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = RegisterSubject,
    responses(
        (status = 201, description = "Subject registered successfully", body = Object, example = json!({
            "message": "Subject registered successfully",
            "id": 1
        })),
        (status = 400, description = "Missing token or name"),
        (status = 409, description = "Card already registered", body = Object, example = json!({
            "error": "Card already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Subject"
)]
pub async fn create_subject<S>(
    state: web::Data<AppState<S>>,
    payload: web::Json<RegisterSubject>,
) -> HttpResponse
where
    S: RecordStore + IdentityStore + 'static,
{
    let token = card_filter::normalize(&payload.card_token);
    let name = payload.display_name.trim();

    if token.is_empty() || name.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "card_token and display_name must not be empty"
        }));
    }

    match state.store.register(&token, name).await {
        Ok(subject) => {
            // if insert success, populate filter and keep cache warm.
            card_filter::insert(&subject.card_token);
            identity_cache::remember(&subject).await;

            HttpResponse::Created().json(json!({
                "message": "Subject registered successfully",
                "id": subject.id
            }))
        }
        Err(StoreError::Conflict) => HttpResponse::Conflict().json(json!({
            "error": "Card already registered"
        })),
        Err(e) => {
            tracing::error!(error = %e, "Subject registration failed");
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }))
        }
    }
}

/// List registered subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("per_page" = Option<u32>, Query, description = "Page size, default 20")
    ),
    responses(
        (status = 200, description = "Subject page", body = SubjectListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Subject"
)]
pub async fn list_subjects<S>(
    state: web::Data<AppState<S>>,
    query: web::Query<SubjectQuery>,
) -> HttpResponse
where
    S: RecordStore + IdentityStore + 'static,
{
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    match state.store.list(page, per_page).await {
        Ok((data, total)) => HttpResponse::Ok().json(SubjectListResponse {
            data,
            page,
            per_page,
            total,
        }),
        Err(e) => {
            tracing::error!(error = %e, "Subject listing failed");
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            }))
        }
    }
}
