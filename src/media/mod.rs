// src/media/mod.rs

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::error::AppResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 一条可下载的字幕
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub lang: String,
    pub ext: String,
    pub url: String,
}

/// 媒体下载器的能力接口
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// 列出媒体的全部字幕语言
    async fn list_subtitles(&self, media_url: &str) -> AppResult<Vec<SubtitleTrack>>;

    /// 下载最高画质的视频并合并音视频。`output_stem` 不含扩展名，返回最终文件路径。
    async fn fetch_video(&self, media_url: &str, output_stem: &Path) -> AppResult<PathBuf>;
}
