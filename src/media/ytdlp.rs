// src/media/ytdlp.rs

use super::{MediaFetcher, SubtitleTrack};
use crate::{config::AppConfig, error::*};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;

/// 通过外部 `yt-dlp` 进程下载视频与查询字幕
pub struct YtDlpFetcher {
    bin: PathBuf,
    referer: String,
    concurrent_fragments: u32,
    preferred_subtitle_ext: String,
}

impl YtDlpFetcher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bin: config.ytdlp_path.clone(),
            referer: config.media_referer.clone(),
            concurrent_fragments: config.concurrent_fragments,
            preferred_subtitle_ext: config.preferred_subtitle_ext.clone(),
        }
    }

    async fn run(&self, args: &[String]) -> AppResult<Vec<u8>> {
        debug!("执行 {} {:?}", self.bin.display(), args);
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::MediaFetcher {
                status: output.status.to_string(),
                stderr: stderr_tail(&stderr, 5),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn list_subtitles(&self, media_url: &str) -> AppResult<Vec<SubtitleTrack>> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--referer".to_string(),
            self.referer.clone(),
            media_url.to_string(),
        ];
        let stdout = self.run(&args).await?;
        let info: Value = serde_json::from_slice(&stdout)?;
        let tracks = parse_subtitle_tracks(&info, &self.preferred_subtitle_ext);
        debug!("找到 {} 条字幕", tracks.len());
        Ok(tracks)
    }

    async fn fetch_video(&self, media_url: &str, output_stem: &Path) -> AppResult<PathBuf> {
        let template = format!("{}.%(ext)s", escape_template(&output_stem.to_string_lossy()));
        let args = vec![
            "-f".to_string(),
            "bestvideo*+bestaudio/best".to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--concurrent-fragments".to_string(),
            self.concurrent_fragments.to_string(),
            "--referer".to_string(),
            self.referer.clone(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            "-o".to_string(),
            template,
            media_url.to_string(),
        ];
        let stdout = self.run(&args).await?;
        let printed = String::from_utf8_lossy(&stdout);
        let path = printed
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                // 标题中可能含有 `.`，不能用 with_extension
                let mut name = output_stem.as_os_str().to_owned();
                name.push(".mp4");
                PathBuf::from(name)
            });
        debug!("yt-dlp 输出文件: {}", path.display());
        Ok(path)
    }
}

/// 从 yt-dlp 的 JSON 信息中提取每种语言的一条字幕，优先选择指定格式。
pub(crate) fn parse_subtitle_tracks(info: &Value, preferred_ext: &str) -> Vec<SubtitleTrack> {
    let Some(subtitles) = info.get("subtitles").and_then(Value::as_object) else {
        return Vec::new();
    };
    subtitles
        .iter()
        .filter_map(|(lang, formats)| {
            let formats = formats.as_array()?;
            let chosen = formats
                .iter()
                .find(|f| f.get("ext").and_then(Value::as_str) == Some(preferred_ext))
                .or_else(|| formats.first())?;
            Some(SubtitleTrack {
                lang: lang.clone(),
                ext: chosen.get("ext").and_then(Value::as_str)?.to_string(),
                url: chosen.get("url").and_then(Value::as_str)?.to_string(),
            })
        })
        .collect()
}

/// yt-dlp 输出模板中 `%` 需要转义
fn escape_template(s: &str) -> String {
    s.replace('%', "%%")
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join(" | ")
}
