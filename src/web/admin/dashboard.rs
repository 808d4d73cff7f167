use std::borrow::Cow;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AdminLink, AppState, PageLayout, admin_utils::compose_flash_message, escape_html, render_page,
};

use super::{auth::require_admin_user, types::DashboardQuery};

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let auth_user = require_admin_user(&state, &jar).await?;

    let users = state
        .read()
        .await
        .accounts
        .list(params.keyword.as_deref());
    let maintenance = state.maintenance().read().await.clone();

    let mut table_rows = String::new();

    if users.is_empty() {
        table_rows.push_str("<tr><td colspan=\"6\">没有符合条件的用户。</td></tr>");
    } else {
        for user in &users {
            let role = if user.is_admin {
                "管理员"
            } else {
                "工作人员"
            };
            let status = if user.disabled {
                r#"<span class="tag warn">已停用</span>"#
            } else {
                r#"<span class="tag">正常</span>"#
            };
            let last_login = user
                .last_login_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "从未登录".to_string());
            let username = escape_html(&user.username);

            let actions = if user.username == auth_user.username {
                r#"<span class="tag muted">当前账号</span>"#.to_string()
            } else {
                let (toggle_value, toggle_label) = if user.disabled {
                    ("false", "启用")
                } else {
                    ("true", "停用")
                };
                format!(
                    r#"<form method="post" action="/dashboard/users/status" class="inline-form">
                        <input type="hidden" name="username" value="{username}">
                        <input type="hidden" name="disabled" value="{toggle_value}">
                        <button type="submit">{toggle_label}</button>
                    </form>
                    <form method="post" action="/dashboard/users/delete" class="inline-form" onsubmit="return confirm('确认删除用户 {username}？');">
                        <input type="hidden" name="username" value="{username}">
                        <button type="submit" class="danger">删除</button>
                    </form>"#
                )
            };

            table_rows.push_str(&format!(
                "<tr><td>{username}</td><td>{display}</td><td>{role}</td><td>{status}</td><td>{last_login}</td><td>{actions}</td></tr>",
                display = escape_html(&user.display_name),
            ));
        }
    }

    let message_block = compose_flash_message(params.status.as_deref(), params.error.as_deref());
    let keyword = escape_html(params.keyword.as_deref().unwrap_or_default());
    let maintenance_state = if maintenance.enabled {
        r#"<span class="tag warn">维护中</span>"#
    } else {
        r#"<span class="tag">正常服务</span>"#
    };
    let maintenance_checked = if maintenance.enabled { " checked" } else { "" };
    let maintenance_meta = match (&maintenance.updated_at, &maintenance.updated_by) {
        (Some(at), Some(by)) => format!(
            "最近由 {} 于 {} 修改。",
            escape_html(by),
            at.format("%Y-%m-%d %H:%M")
        ),
        _ => "自启动以来未修改。".to_string(),
    };

    let body = format!(
        r#"<section class="panel">
    <h2>账号管理</h2>
    <form method="get" action="/dashboard" class="inline-form">
        <input name="keyword" value="{keyword}" placeholder="按用户名或姓名搜索">
        <button type="submit">搜索</button>
    </form>
    <table>
        <thead><tr><th>用户名</th><th>姓名</th><th>角色</th><th>状态</th><th>最近登录</th><th>操作</th></tr></thead>
        <tbody>{table_rows}</tbody>
    </table>
</section>
<section class="panel">
    <h2>创建账号</h2>
    <form method="post" action="/dashboard/users" class="form-grid">
        <div><label for="new-username">用户名</label><input id="new-username" name="username" required></div>
        <div><label for="new-display">姓名</label><input id="new-display" name="display_name" placeholder="可选"></div>
        <div><label for="new-password">密码</label><input id="new-password" type="password" name="password" required></div>
        <div><label><input type="checkbox" name="is_admin" value="on"> 授予管理员权限</label></div>
        <div><button type="submit">创建用户</button></div>
    </form>
</section>
<section class="panel">
    <h2>重置密码</h2>
    <form method="post" action="/dashboard/users/password" class="form-grid">
        <div><label for="reset-username">用户名</label><input id="reset-username" name="username" required></div>
        <div><label for="reset-password">新密码</label><input id="reset-password" type="password" name="password" required></div>
        <div><button type="submit">更新密码</button></div>
    </form>
</section>
<section class="panel">
    <h2>维护模式 {maintenance_state}</h2>
    <p class="note">{maintenance_meta}</p>
    <form method="post" action="/dashboard/maintenance">
        <label><input type="checkbox" name="enabled" value="on"{maintenance_checked}> 开启维护模式（仅管理员可继续访问）</label>
        <label for="maintenance-message">维护提示语</label>
        <textarea id="maintenance-message" name="message" rows="3">{maintenance_message}</textarea>
        <p><button type="submit">保存维护设置</button></p>
    </form>
</section>"#,
        maintenance_message = escape_html(&maintenance.message),
    );

    Ok(Html(render_page(PageLayout {
        meta_title: "管理后台",
        page_heading: "管理后台",
        note_html: Cow::Owned(format!(
            "当前登录：{}。在此维护工作人员账号与系统维护模式。",
            escape_html(&auth_user.display_name)
        )),
        flash_html: Cow::Owned(message_block),
        body_html: Cow::Owned(body),
        show_back_link: true,
        admin_link: Some(AdminLink {
            href: "/dashboard/api-docs",
            label: "接口文档",
        }),
    })))
}
