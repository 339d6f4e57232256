//! Branch directory, stock levels and the branch sales report.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use aurora_core::{Branch, SalesSummary, ValidationError};
use aurora_db::repository::BranchStock;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Report window. Defaults to the current UTC day.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SummaryQuery {
    fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);

        let from = self.from.unwrap_or(start_of_day);
        let to = self.to.unwrap_or(from + Duration::days(1));

        if from >= to {
            return Err(ValidationError::Inconsistent {
                field: "to".to_string(),
                reason: "must be after from".to_string(),
            });
        }
        Ok((from, to))
    }
}

/// `GET /api/branches`
pub async fn list_branches(State(state): State<AppState>) -> ApiResult<Json<Vec<Branch>>> {
    Ok(Json(state.db.branches().list().await?))
}

/// `GET /api/branches/{id}/stock`
pub async fn branch_stock(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> ApiResult<Json<BranchStock>> {
    require_branch(&state, &branch_id).await?;
    Ok(Json(state.db.stock().list_for_branch(&branch_id).await?))
}

/// `GET /api/branches/{id}/sales/summary?from&to`
///
/// `from` is inclusive, `to` exclusive, both RFC 3339.
pub async fn sales_summary(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<SalesSummary>> {
    let Query(query) = query?;
    let (from, to) = query.window(Utc::now())?;
    require_branch(&state, &branch_id).await?;

    Ok(Json(state.db.sales().summary(&branch_id, from, to).await?))
}

async fn require_branch(state: &AppState, branch_id: &str) -> ApiResult<()> {
    match state.db.branches().get(branch_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Branch", branch_id)),
    }
}
