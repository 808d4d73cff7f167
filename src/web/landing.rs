use std::borrow::Cow;

use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    modules::{
        announcements::Announcement,
        families::FamilyStatus,
        reports::{ReportOverview, build_overview},
    },
    web::{
        AdminLink, AppState, AuthUser, PageLayout, SITE_TITLE, auth, escape_html,
        render_login_page, render_page,
    },
};

#[derive(Default, Deserialize)]
pub struct LandingQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LandingQuery>,
) -> Html<String> {
    let Some(user) = auth::current_user(&state, &jar).await else {
        return Html(render_login_page(None));
    };

    let (overview, announcements, unread) = {
        let store = state.read().await;
        let mut announcements = store.announcements.published();
        announcements.truncate(3);
        (
            build_overview(&store, None, Utc::now()),
            announcements,
            store.notifications.unread_count(user.id),
        )
    };

    Html(render_main_page(&user, &params, &overview, &announcements, unread))
}

fn render_main_page(
    user: &AuthUser,
    params: &LandingQuery,
    overview: &ReportOverview,
    announcements: &[Announcement],
    unread_notifications: usize,
) -> String {
    let pending = overview
        .by_status
        .iter()
        .find(|entry| entry.status == FamilyStatus::Pending)
        .map(|entry| entry.count)
        .unwrap_or_default();

    let stats = [
        ("在册家庭", overview.total_families.to_string()),
        ("待审核", pending.to_string()),
        (
            "月度补贴总额（元）",
            format!("{:.2}", overview.approved_monthly_subsidy),
        ),
        ("待处理留言", overview.pending_messages.to_string()),
        ("未读通知", unread_notifications.to_string()),
    ];
    let stat_cards = stats
        .iter()
        .map(|(label, value)| {
            format!(r#"<div class="stat-card"><span class="note">{label}</span><strong>{value}</strong></div>"#)
        })
        .collect::<String>();

    let modules = [
        ("接口文档", "浏览并导出平台全部接口说明。", "/dashboard/api-docs"),
        ("家庭档案", "按地区、状态与救助类型检索家庭档案。", "/api/families"),
        ("统计报表", "下载包含家庭明细与地区汇总的 Excel 报表。", "/api/reports/export.xlsx"),
        ("群众留言", "查看并回复公众提交的留言。", "/api/messages"),
    ];
    let module_cards = modules
        .iter()
        .map(|(title, description, href)| {
            format!(
                r#"<a class="stat-card" href="{href}" style="text-decoration:none;color:inherit;"><h3>{title}</h3><p class="note">{description}</p></a>"#,
            )
        })
        .collect::<String>();

    let announcement_items = if announcements.is_empty() {
        "<li>暂无已发布公告。</li>".to_string()
    } else {
        announcements
            .iter()
            .map(|item| {
                format!(
                    r#"<li>{pin}<span class="tag muted">{category}</span> {title}</li>"#,
                    pin = if item.pinned {
                        r#"<span class="tag warn">置顶</span> "#
                    } else {
                        ""
                    },
                    category = item.category.label_zh(),
                    title = escape_html(&item.title),
                )
            })
            .collect()
    };

    let body = format!(
        r#"<section><div class="stat-grid">{stat_cards}</div></section>
<section class="panel">
    <h2>最新公告</h2>
    <ul>{announcement_items}</ul>
</section>
<section><div class="stat-grid">{module_cards}</div></section>"#,
    );

    let admin_link = user.is_admin.then_some(AdminLink {
        href: "/dashboard",
        label: "管理后台",
    });

    render_page(PageLayout {
        meta_title: SITE_TITLE,
        page_heading: SITE_TITLE,
        note_html: Cow::Owned(format!(
            "当前登录：<strong>{}</strong>",
            escape_html(&user.display_name)
        )),
        flash_html: Cow::Owned(compose_landing_flash(params)),
        body_html: Cow::Owned(body),
        show_back_link: false,
        admin_link,
    })
}

fn compose_landing_flash(params: &LandingQuery) -> String {
    if params.status.as_deref() == Some("logged_out") {
        return r#"<div class="flash success">已退出登录。</div>"#.to_string();
    }

    if let Some(error) = params.error.as_deref() {
        let message = match error {
            "not_authorized" => "该操作需要管理员权限。",
            _ => "发生未知错误，请稍后重试。",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}
