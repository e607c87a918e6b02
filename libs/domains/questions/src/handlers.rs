use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{delete, get, post},
};
use axum_helpers::errors::responses::{BadRequestExtractionResponse, InternalServerErrorResponse};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::QuestionResult;
use crate::models::{
    ClientErrorBody, DeleteResponse, SearchHit, SearchParams, SearchResponse, UploadQuestion,
    UploadResponse,
};
use crate::repository::VectorStore;
use crate::service::QuestionService;

pub const TAG: &str = "questions";

/// OpenAPI documentation for the question endpoints
#[derive(OpenApi)]
#[openapi(
    paths(upload_question, search_questions, delete_question),
    components(
        schemas(
            UploadQuestion,
            UploadResponse,
            SearchHit,
            SearchResponse,
            DeleteResponse,
            ClientErrorBody
        ),
        responses(BadRequestExtractionResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = TAG, description = "Store and search natural-language questions with their SQL")
    )
)]
pub struct ApiDoc;

/// Create the question router with all HTTP endpoints
pub fn router<S: VectorStore + 'static>(service: Arc<QuestionService<S>>) -> Router {
    Router::new()
        .route("/upload", post(upload_question))
        .route("/search", get(search_questions))
        .route("/delete/{question_id}", delete(delete_question))
        .with_state(service)
}

/// Store a question and its SQL query
#[utoipa::path(
    post,
    path = "/upload",
    tag = TAG,
    request_body = UploadQuestion,
    responses(
        (status = 200, description = "Question stored", body = UploadResponse),
        (status = 400, description = "Missing question or sql_query", body = ClientErrorBody),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upload_question<S: VectorStore>(
    State(service): State<Arc<QuestionService<S>>>,
    payload: Result<Json<UploadQuestion>, JsonRejection>,
) -> QuestionResult<Json<UploadResponse>> {
    let Json(input) = payload?;
    let question_id = service.upload(input).await?;

    Ok(Json(UploadResponse {
        message: "Uploaded successfully".to_string(),
        question_id,
    }))
}

/// Find the stored questions closest to the given text
#[utoipa::path(
    get,
    path = "/search",
    tag = TAG,
    params(SearchParams),
    responses(
        (status = 200, description = "Matches, most similar first", body = SearchResponse),
        (status = 400, description = "Missing question or non-integer k", body = ClientErrorBody),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_questions<S: VectorStore>(
    State(service): State<Arc<QuestionService<S>>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> QuestionResult<Json<SearchResponse>> {
    let Query(pairs) = pairs?;
    let results = service.search(SearchParams::from_pairs(pairs)).await?;
    Ok(Json(SearchResponse { results }))
}

/// Delete a stored question. Succeeds whether or not the id exists.
#[utoipa::path(
    delete,
    path = "/delete/{question_id}",
    tag = TAG,
    params(("question_id" = String, Path, description = "Id returned by upload")),
    responses(
        (status = 200, description = "Question deleted", body = DeleteResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_question<S: VectorStore>(
    State(service): State<Arc<QuestionService<S>>>,
    Path(question_id): Path<String>,
) -> QuestionResult<Json<DeleteResponse>> {
    service.delete(&question_id).await?;

    Ok(Json(DeleteResponse {
        message: format!("Question {} deleted successfully.", question_id),
    }))
}
