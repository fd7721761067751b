use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::database::Row;
use crate::services::ResultSet;

/// Envelope `result` codes besides the error code.
pub const RESULT_SUCCESS: i32 = 1;
pub const RESULT_TRUNCATED: i32 = 2;
pub const RESULT_NO_RESULTS: i32 = -2;

/// Successful `/api/epidata` reply. Errors render through `EpidataError`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpidataResponse {
    pub result: i32,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epidata: Option<Vec<Row>>,
}

impl EpidataResponse {
    pub fn rows(&self) -> usize {
        self.epidata.as_ref().map_or(0, Vec::len)
    }
}

impl From<ResultSet> for EpidataResponse {
    fn from(results: ResultSet) -> Self {
        if results.is_empty() {
            return Self { result: RESULT_NO_RESULTS, message: "no results", epidata: None };
        }
        let (result, message) = if results.truncated {
            (RESULT_TRUNCATED, "too many results, data truncated")
        } else {
            (RESULT_SUCCESS, "success")
        };
        Self { result, message, epidata: Some(results.rows) }
    }
}

impl IntoResponse for EpidataResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
