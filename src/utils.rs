// src/utils.rs

use crate::constants;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 清理标题: 只保留可打印 ASCII 字符，去除路径非法字符、emoji 与控制字符。
pub fn sanitize_title(name: &str) -> String {
    // 非 ASCII 字符 (含 emoji) 与控制字符都视为空白
    let printable: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { ' ' })
        .collect();
    let name = ILLEGAL_CHARS_RE.replace_all(&printable, " ");
    let name = WHITESPACE_RE.replace_all(&name, " ");
    let name = name.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if name.is_empty() {
        return constants::UNTITLED.to_string();
    }
    name.to_string()
}

/// 清理并截断标题，使 `NN-标题` 加上最长的产物后缀不超过最大文件名长度。
pub fn fit_title(index: usize, title: &str) -> String {
    let budget = constants::MAX_FILENAME_BYTES
        .saturating_sub(index_prefix(index).len())
        .saturating_sub(constants::LONGEST_ARTIFACT_SUFFIX.len());
    fit_to_budget(&sanitize_title(title), budget)
}

/// 课程目录名: 清理后的课程标题，截断到最大文件名长度以内
pub fn course_dir_name(title: &str) -> String {
    fit_to_budget(&sanitize_title(title), constants::MAX_FILENAME_BYTES)
}

fn fit_to_budget(sanitized: &str, budget: usize) -> String {
    if sanitized.len() <= budget {
        return sanitized.to_string();
    }
    // 清理后只剩 ASCII，按字节截断是安全的
    let truncated = sanitized[..budget].trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    if truncated.is_empty() {
        constants::UNTITLED[..constants::UNTITLED.len().min(budget)].to_string()
    } else {
        truncated.to_string()
    }
}

/// `NN-` 形式的两位序号前缀
pub fn index_prefix(index: usize) -> String {
    format!("{:02}-", index)
}

/// 章节目录名: 两位序号 + 清理后的章节标题
pub fn numbered_name(index: usize, title: &str) -> String {
    format!("{}{}", index_prefix(index), fit_title(index, title))
}

/// 去掉图片地址中的缩放指令，得到高清版本地址。
/// 例如 `https://cdn.example.com/resize=width:480/abc` -> `https://cdn.example.com/abc`
pub fn hd_image_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let kept: Vec<&str> = segments.iter().copied().filter(|s| !s.starts_with("resize=")).collect();
    if kept.len() == segments.len() {
        return None;
    }
    let path = format!("/{}", kept.join("/"));
    parsed.set_path(&path);
    Some(parsed.to_string())
}

/// 从 URL 的最后一段路径推断文件名
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = percent_decode_str(last).decode_utf8_lossy();
    Some(decoded.into_owned())
}

/// 清理附件等普通文件名，保留扩展名
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized = sanitize_title(name);
    if sanitized.len() <= constants::MAX_FILENAME_BYTES {
        return sanitized;
    }
    match sanitized.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 16 => {
            let max_stem = constants::MAX_FILENAME_BYTES - ext.len() - 1;
            format!("{}.{}", &stem[..max_stem.min(stem.len())], ext)
        }
        _ => sanitized[..constants::MAX_FILENAME_BYTES].to_string(),
    }
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}
