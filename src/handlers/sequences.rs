use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::database::sequence;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantConnection};

const DEFAULT_WIDTH: usize = 4;
const MAX_WIDTH: usize = 12;

#[derive(Debug, Deserialize)]
pub struct SequenceQuery {
    pub prefix: Option<String>,
    pub width: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AllocatedCode {
    pub name: String,
    pub value: i64,
    pub code: String,
}

/// POST /api/sequences/:name - allocate the next document code for today
pub async fn sequence_post(
    Path(name): Path<String>,
    Query(query): Query<SequenceQuery>,
    Extension(conn): Extension<TenantConnection>,
) -> ApiResult<AllocatedCode> {
    if !sequence::is_valid_name(&name) {
        return Err(ApiError::bad_request(format!("Invalid sequence name '{}'", name)));
    }
    let prefix = query.prefix.unwrap_or_default();
    if prefix.len() > 8 || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::bad_request("Prefix must be up to 8 alphanumeric characters"));
    }
    let width = code_width(query.width);

    let today = chrono::Utc::now().date_naive();
    let pool = conn.handle.pool().await?;
    let value = sequence::next_value(&pool, &sequence::daily_key(&name, today)).await?;

    Ok(ApiResponse::created(AllocatedCode {
        code: sequence::format_code(&prefix, today, value, width),
        name,
        value,
    }))
}

fn code_width(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_WIDTH).clamp(1, MAX_WIDTH)
}
