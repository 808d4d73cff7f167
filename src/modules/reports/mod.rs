mod export;
mod stats;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::web::{ApiError, AppState, auth::require_user_json, json_error};

pub use export::export_workbook;
pub use stats::{ReportOverview, build_overview, families_in, region_stats};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/overview", get(overview))
        .route("/api/reports/export.xlsx", get(export))
}

#[derive(Default, Deserialize)]
struct RegionQuery {
    #[serde(default)]
    region: Option<String>,
}

async fn overview(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RegionQuery>,
) -> Result<Json<ReportOverview>, ApiError> {
    require_user_json(&state, &jar).await?;
    let store = state.read().await;
    Ok(Json(build_overview(&store, query.region.as_deref(), Utc::now())))
}

async fn export(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RegionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let bytes = {
        let store = state.read().await;
        let families = families_in(store.families.all(), query.region.as_deref());
        export_workbook(&families, &region_stats(&families))
    }
    .map_err(|err| {
        error!(?err, "failed to build report workbook");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "生成报表失败，请稍后再试。")
    })?;

    let filename = format!("subsidy-report-{}.xlsx", Utc::now().format("%Y%m%d"));
    info!(by = %user.username, size = bytes.len(), "report workbook exported");
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
