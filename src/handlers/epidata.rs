use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{EpidataError, RESULT_ERROR};
use crate::sources::{Params, Source};

use super::response::EpidataResponse;

/// GET /api/epidata - every parameter in the query string
pub async fn epidata_get(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    dispatch(state, Params::new(query)).await
}

/// POST /api/epidata - form-encoded parameters, for requests too long for a URL
pub async fn epidata_post(State(state): State<AppState>, Form(form): Form<HashMap<String, String>>) -> Response {
    dispatch(state, Params::new(form)).await
}

async fn dispatch(state: AppState, params: Params) -> Response {
    let request_id = Uuid::new_v4();
    let source = params.get("source").unwrap_or_default().to_lowercase();
    let span = tracing::info_span!("epidata", %request_id, source = %source);

    async move {
        match handle(&state, &params).await {
            Ok(response) => {
                tracing::info!(result = response.result, rows = response.rows(), "epidata request");
                response.into_response()
            }
            Err(err) => {
                tracing::info!(result = RESULT_ERROR, rows = 0, error = %err, "epidata request");
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle(state: &AppState, params: &Params) -> Result<EpidataResponse, EpidataError> {
    let source = Source::from_name(params.get("source"))?;
    let results = state.service.query(source, params).await?;
    Ok(EpidataResponse::from(results))
}
