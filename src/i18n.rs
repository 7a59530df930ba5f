// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::task::{CoercionWarning, ParseWarning};

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use schedule_import::i18n::t_with_args;
/// let msg = t_with_args("import.unsupported_format", &[("format", "xlsx")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 解析提示的本地化文本
pub fn parse_warning_message(warning: &ParseWarning) -> String {
    match warning {
        ParseWarning::DuplicateHeader { header, column } => t_with_args(
            "import.warning.duplicate_header",
            &[("header", header.as_str()), ("column", column.to_string().as_str())],
        ),
        ParseWarning::ExtraFields {
            row,
            expected,
            found,
        } => t_with_args(
            "import.warning.extra_fields",
            &[
                ("row", row.to_string().as_str()),
                ("expected", expected.to_string().as_str()),
                ("found", found.to_string().as_str()),
            ],
        ),
        ParseWarning::EmptyFile => t("import.warning.empty_file"),
    }
}

/// 类型转换警告的本地化文本
pub fn coercion_warning_message(warning: &CoercionWarning) -> String {
    t_with_args(
        "import.warning.coercion",
        &[
            ("row", warning.row_number.to_string().as_str()),
            ("header", warning.header.as_str()),
            ("kind", warning.expected.to_string().as_str()),
            ("value", warning.raw_value.as_str()),
        ],
    )
}
