// src/utils.rs

use crate::{constants, error::*, models::VideoInfo, symbols};
use anyhow::Context;
use regex::Regex;
use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 千位分组 (en-US 风格): 1234567 -> "1,234,567"
pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 不足一小时为 `M:SS`，否则为 `H:MM:SS`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// 信息面板中的章节摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterListing {
    NoChapters,
    Chapters {
        count: usize,
        titles: Vec<String>,
        remaining: usize,
    },
}

impl ChapterListing {
    pub fn from_info(info: &VideoInfo) -> Self {
        if info.chapter_count == 0 {
            return ChapterListing::NoChapters;
        }
        ChapterListing::Chapters {
            count: info.chapter_count,
            titles: info
                .chapters
                .iter()
                .take(constants::MAX_LISTED_CHAPTERS)
                .map(|ch| ch.title.clone())
                .collect(),
            remaining: info
                .chapter_count
                .saturating_sub(constants::MAX_LISTED_CHAPTERS),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            ChapterListing::NoChapters => vec![constants::messages::NO_CHAPTERS.to_string()],
            ChapterListing::Chapters { count, titles, remaining } => {
                let mut lines = vec![
                    format!("{} Chapters Found", count),
                    constants::messages::CHAPTERS_MERGED.to_string(),
                ];
                lines.extend(titles.iter().map(|t| format!("  {} {}", symbols::BULLET, t)));
                if *remaining > 0 {
                    lines.push(format!("  {} ... and {} more", symbols::BULLET, remaining));
                }
                lines
            }
        }
    }
}

pub fn sanitize_filename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() { return "unknown".to_string(); }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, " ").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string();
    if name.is_empty() { return "unnamed".to_string(); }

    if name.len() > constants::MAX_FILENAME_BYTES {
        if let (Some(stem_part), Some(ext)) = (Path::new(&name).file_stem(), Path::new(&name).extension()) {
            let stem_part_str = stem_part.to_string_lossy();
            let ext_str = format!(".{}", ext.to_string_lossy());
            let max_stem_bytes = constants::MAX_FILENAME_BYTES.saturating_sub(ext_str.len());
            let truncated_stem = safe_truncate_utf8(&stem_part_str, max_stem_bytes);
            name = format!("{}{}", truncated_stem, ext_str);
        } else {
            name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string();
        }
    }
    name
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes { return s; }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    &s[..i]
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

pub fn secure_join_path(base_dir: &Path, relative_path: &Path) -> AppResult<PathBuf> {
    let resolved_base = dunce::canonicalize(base_dir).with_context(|| format!("output directory '{:?}' does not exist or is not accessible", base_dir))?;
    let mut final_path = resolved_base.clone();
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => final_path.push(part),
            Component::ParentDir => return Err(AppError::Security("path traversal '..' detected".to_string())),
            _ => continue,
        }
    }
    if !final_path.starts_with(&resolved_base) {
        return Err(AppError::Security(format!("path escapes the output directory: '{:?}'", relative_path)));
    }
    Ok(final_path)
}
