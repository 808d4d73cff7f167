mod catalog;

use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::web::{
    AdminLink, ApiError, ApiMessage, AppState, PageLayout,
    admin::require_signed_in_user,
    auth::{require_admin_json, require_user_json},
    domain_error, escape_html, json_ok, render_page,
};

pub use catalog::{
    ApiCatalog, ApiEndpointDoc, ApiEndpointInput, ApiParamDoc, ParamLocation, TagSummary,
    render_markdown,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/docs", get(list_docs).post(create_doc))
        .route("/api/docs/tags", get(list_tags))
        .route("/api/docs/export.md", get(export_markdown))
        .route(
            "/api/docs/:id",
            get(show_doc).put(update_doc).delete(delete_doc),
        )
        .route("/dashboard/api-docs", get(docs_page))
}

#[derive(Default, Deserialize)]
struct DocsQuery {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
}

async fn list_docs(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DocsQuery>,
) -> Result<Json<Vec<ApiEndpointDoc>>, ApiError> {
    require_user_json(&state, &jar).await?;
    let store = state.read().await;
    Ok(Json(
        store
            .api_docs
            .list(query.tag.as_deref(), query.keyword.as_deref()),
    ))
}

async fn list_tags(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<TagSummary>>, ApiError> {
    require_user_json(&state, &jar).await?;
    Ok(Json(state.read().await.api_docs.tags()))
}

async fn export_markdown(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DocsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_user_json(&state, &jar).await?;
    let docs = state
        .read()
        .await
        .api_docs
        .list(query.tag.as_deref(), query.keyword.as_deref());

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"api-docs.md\"",
            ),
        ],
        render_markdown(&docs),
    ))
}

async fn show_doc(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEndpointDoc>, ApiError> {
    require_user_json(&state, &jar).await?;
    let store = state.read().await;
    store
        .api_docs
        .get(id)
        .cloned()
        .map(Json)
        .map_err(domain_error)
}

async fn create_doc(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<ApiEndpointInput>,
) -> Result<Json<ApiEndpointDoc>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    let doc = state
        .write()
        .await
        .api_docs
        .create(input, Utc::now())
        .map_err(domain_error)?;

    info!(method = %doc.method, path = %doc.path, by = %user.username, "api doc created");
    Ok(Json(doc))
}

async fn update_doc(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(input): Json<ApiEndpointInput>,
) -> Result<Json<ApiEndpointDoc>, ApiError> {
    require_admin_json(&state, &jar).await?;
    state
        .write()
        .await
        .api_docs
        .update(id, input, Utc::now())
        .map(Json)
        .map_err(domain_error)
}

async fn delete_doc(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    require_admin_json(&state, &jar).await?;
    state
        .write()
        .await
        .api_docs
        .delete(id)
        .map_err(domain_error)?;
    Ok(json_ok("已删除接口文档。"))
}

async fn docs_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DocsQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_signed_in_user(&state, &jar).await?;

    let (tags, docs) = {
        let store = state.read().await;
        (
            store.api_docs.tags(),
            store.api_docs.list(query.tag.as_deref(), query.keyword.as_deref()),
        )
    };

    let mut tag_links = String::from(r#"<a class="tag" href="/dashboard/api-docs">全部</a> "#);
    for summary in &tags {
        tag_links.push_str(&tag_link(&summary.tag, summary.count));
    }

    let mut rows = String::new();
    if docs.is_empty() {
        rows.push_str(r#"<tr><td colspan="4">没有符合条件的接口。</td></tr>"#);
    }
    for doc in &docs {
        let params = doc
            .params
            .iter()
            .map(|param| {
                format!(
                    "<code>{name}</code>（{location}{required}）{description}",
                    name = escape_html(&param.name),
                    location = param.location.label_zh(),
                    required = if param.required { "，必填" } else { "" },
                    description = escape_html(&param.description),
                )
            })
            .collect::<Vec<_>>()
            .join("<br>");
        let sample = doc
            .sample_response
            .as_ref()
            .and_then(|value| serde_json::to_string_pretty(value).ok())
            .map(|pretty| format!("<pre>{}</pre>", escape_html(&pretty)))
            .unwrap_or_default();
        let deprecated = if doc.deprecated {
            r#" <span class="tag warn">已废弃</span>"#
        } else {
            ""
        };

        rows.push_str(&format!(
            "<tr><td><span class=\"tag\">{method}</span> <code>{path}</code>{deprecated}</td><td>{tag}</td><td>{summary}{description}{sample}</td><td>{params}</td></tr>",
            method = escape_html(&doc.method),
            path = escape_html(&doc.path),
            tag = escape_html(&doc.tag),
            summary = escape_html(&doc.summary),
            description = doc
                .description
                .as_deref()
                .map(|text| format!("<p class=\"note\">{}</p>", escape_html(text)))
                .unwrap_or_default(),
        ));
    }

    let keyword = escape_html(query.keyword.as_deref().unwrap_or_default());
    let body = format!(
        r#"<section class="panel">
            <h2>接口列表</h2>
            <p>{tag_links}</p>
            <form method="get" action="/dashboard/api-docs" class="inline-form">
                <input name="keyword" value="{keyword}" placeholder="按路径或简介搜索">
                <button type="submit">搜索</button>
            </form>
            <p class="note"><a href="/api/docs/export.md">导出 Markdown 文档</a></p>
            <table>
                <thead><tr><th>接口</th><th>分组</th><th>说明</th><th>参数</th></tr></thead>
                <tbody>{rows}</tbody>
            </table>
        </section>"#,
    );

    let admin_link = user.is_admin.then_some(AdminLink {
        href: "/dashboard",
        label: "管理后台",
    });

    Ok(Html(render_page(PageLayout {
        meta_title: "接口文档",
        page_heading: "接口文档",
        note_html: Cow::Borrowed("浏览平台对外提供的全部接口，管理员可通过接口维护文档条目。"),
        flash_html: Cow::Borrowed(""),
        body_html: Cow::Owned(body),
        show_back_link: true,
        admin_link,
    })))
}

fn tag_link(tag: &str, count: usize) -> String {
    format!(
        r#"<a class="tag muted" href="/dashboard/api-docs?tag={query}">{label} ({count})</a> "#,
        query = urlencoding::encode(tag),
        label = escape_html(tag),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_links_encode_the_query_value() {
        let link = tag_link("家庭 & 成员#1", 3);
        assert!(link.contains(
            r#"href="/dashboard/api-docs?tag=%E5%AE%B6%E5%BA%AD%20%26%20%E6%88%90%E5%91%98%231""#
        ));
        assert!(link.contains("家庭 &amp; 成员#1 (3)"));
    }
}
