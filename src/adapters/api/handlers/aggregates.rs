use crate::adapters::api::models::api_response::ApiResponse;
use crate::adapters::api::server::ApiState;
use crate::utils::error::AggregatorError;
use actix_web::{get, web, HttpResponse, Responder};
use std::sync::Arc;

/// Returns the current live aggregate records, busiest pairs first.
///
/// This is the on-demand counterpart of the summary messages pushed to
/// subscribers: the same snapshot, served over plain HTTP for clients that do
/// not hold a streaming connection.
///
/// # Responses
/// - **200 OK**: a JSON object containing the list of live aggregate records.
/// - **5XX**: the aggregate store could not be read.
#[get("/aggregates")]
pub async fn get_aggregates(
    state: web::Data<Arc<ApiState>>,
) -> Result<impl Responder, AggregatorError> {
    let mut records = state.store.snapshot().await?;
    records.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(HttpResponse::Ok().json(ApiResponse::new(records)))
}
