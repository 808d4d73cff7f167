mod import;
mod registry;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    modules::notifications::NotificationLevel,
    store::Page,
    web::{
        ApiError, ApiMessage, AppState,
        auth::{require_admin_json, require_user_json},
        domain_error, json_error, json_ok,
    },
};

pub use import::{ImportSummary, import_families};
pub use registry::{
    Family, FamilyInput, FamilyMember, FamilyPatch, FamilyQuery, FamilyRegistry, FamilyStatus,
    FamilyView, MemberInput, ReviewAction, SubsidyType, round_cents,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/families", get(search_families).post(create_family))
        .route("/api/families/import", post(import_workbook))
        .route(
            "/api/families/:id",
            get(show_family).put(update_family).delete(delete_family),
        )
        .route("/api/families/:id/members", post(add_member))
        .route(
            "/api/families/:id/members/:member_id",
            delete(remove_member),
        )
        .route("/api/families/:id/review", post(review_family))
}

#[derive(Deserialize)]
struct ReviewRequest {
    action: ReviewAction,
    #[serde(default)]
    note: Option<String>,
}

async fn search_families(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<FamilyQuery>,
) -> Result<Json<Page<FamilyView>>, ApiError> {
    require_user_json(&state, &jar).await?;
    Ok(Json(state.read().await.families.search(&query)))
}

async fn show_family(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<FamilyView>, ApiError> {
    require_user_json(&state, &jar).await?;
    let store = state.read().await;
    store
        .families
        .get(id)
        .map(|family| Json(FamilyView::from(family)))
        .map_err(domain_error)
}

async fn create_family(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<FamilyInput>,
) -> Result<Json<FamilyView>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let family = state
        .write()
        .await
        .families
        .create(input, Utc::now())
        .map_err(domain_error)?;

    info!(id = %family.id, region = %family.region, by = %user.username, "family registered");
    Ok(Json(FamilyView::from(&family)))
}

async fn update_family(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(patch): Json<FamilyPatch>,
) -> Result<Json<FamilyView>, ApiError> {
    require_user_json(&state, &jar).await?;
    let family = state
        .write()
        .await
        .families
        .update(id, patch, Utc::now())
        .map_err(domain_error)?;
    Ok(Json(FamilyView::from(&family)))
}

async fn delete_family(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    let removed = state
        .write()
        .await
        .families
        .delete(id)
        .map_err(domain_error)?;

    info!(%id, head = %removed.household_head, by = %user.username, "family deleted");
    Ok(json_ok("已删除家庭档案。"))
}

async fn add_member(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(input): Json<MemberInput>,
) -> Result<Json<FamilyMember>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .families
        .add_member(id, input, Utc::now())
        .map(Json)
        .map_err(domain_error)
}

async fn remove_member(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiMessage>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .families
        .remove_member(id, member_id, Utc::now())
        .map_err(domain_error)?;
    Ok(json_ok("已移除家庭成员。"))
}

async fn review_family(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<FamilyView>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let now = Utc::now();
    let mut store = state.write().await;

    let family = store
        .families
        .review(id, request.action, request.note.as_deref(), now)
        .map_err(domain_error)?;

    let level = match family.status {
        FamilyStatus::Suspended | FamilyStatus::Rejected => NotificationLevel::Warning,
        FamilyStatus::Approved | FamilyStatus::Pending => NotificationLevel::Info,
    };
    let body = match &family.review_note {
        Some(note) => format!("审核人：{}。审核意见：{note}", user.display_name),
        None => format!("审核人：{}。", user.display_name),
    };
    store.notifications.broadcast(
        format!(
            "家庭档案「{}」状态变更为{}",
            family.household_head,
            family.status.label_zh()
        ),
        body,
        level,
        now,
    );

    info!(%id, status = ?family.status, by = %user.username, "family reviewed");
    Ok(Json(FamilyView::from(&family)))
}

async fn import_workbook(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let user = require_user_json(&state, &jar).await?;

    let mut file_bytes = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(?err, "failed to read multipart field");
                return Err(json_error(StatusCode::BAD_REQUEST, "上传内容无法解析。"));
            }
        };

        if field.name() != Some("file") {
            continue;
        }
        if let Some(name) = field.file_name() {
            if !name.to_ascii_lowercase().ends_with(".xlsx") {
                return Err(json_error(StatusCode::BAD_REQUEST, "仅支持上传 .xlsx 文件。"));
            }
        }
        match field.bytes().await {
            Ok(bytes) => file_bytes = Some(bytes),
            Err(err) => {
                error!(?err, "failed to read uploaded workbook");
                return Err(json_error(StatusCode::BAD_REQUEST, "读取上传文件失败。"));
            }
        }
    }

    let Some(bytes) = file_bytes else {
        return Err(json_error(StatusCode::BAD_REQUEST, "请选择要导入的 Excel 文件。"));
    };

    let summary = {
        let mut store = state.write().await;
        import_families(&mut store.families, &bytes, Utc::now())
            .map_err(|err| json_error(StatusCode::BAD_REQUEST, err.to_string()))?
    };

    info!(
        imported = summary.imported,
        skipped = summary.skipped.len(),
        by = %user.username,
        "family workbook imported"
    );
    Ok(Json(summary))
}
