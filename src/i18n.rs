// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"），其他值忽略
pub fn set_locale(locale: &str) {
    match locale {
        "zh-CN" | "en" => rust_i18n::set_locale(locale),
        other => tracing::warn!(locale = other, "不支持的语言代码，保持当前语言"),
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use mushroom_ops::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use mushroom_ops::i18n::t_with_args;
/// let msg = t_with_args("alert.low_stock", &[("name", "Packaging Tins"), ("quantity", "40")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
