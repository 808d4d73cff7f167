/// Compose a flash message HTML snippet for known admin status or error codes.
pub fn compose_flash_message(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "created" => "已成功创建用户。",
            "password_updated" => "已更新密码。",
            "user_disabled" => "已停用该账号，其登录会话已失效。",
            "user_enabled" => "已启用该账号。",
            "user_deleted" => "已删除该账号。",
            "maintenance_on" => "维护模式已开启，非管理员访问将跳转至维护页面。",
            "maintenance_off" => "维护模式已关闭。",
            "logged_out" => "已退出登录。",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "duplicate" => "用户名已存在。",
            "not_authorized" => "需要管理员权限。",
            "missing_username" => "请输入用户名。",
            "missing_password" => "请输入密码。",
            "password_missing" => "请输入新密码。",
            "password_too_short" => "密码至少需要 6 个字符。",
            "invalid_account" => "用户名需为 3-32 位字母、数字、下划线或连字符，密码至少 6 位。",
            "user_missing" => "未找到该用户。",
            "cannot_disable" => "不能停用当前登录的账号或最后一个可用的管理员。",
            "cannot_delete" => "不能删除当前登录的账号或最后一个可用的管理员。",
            "maintenance_invalid" => "维护提示语过长，请精简后再保存。",
            "hash_failed" => "处理密码时出错，请重试。",
            _ => "发生未知错误，请查看日志。",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}
