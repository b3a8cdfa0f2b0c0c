// src/downloader/subtitles.rs

use crate::{
    client::RobustClient,
    media::{MediaFetcher, SubtitleTrack},
    models::ArtifactStatus,
    utils,
};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// `<stem>.<lang>.<ext>`
pub fn subtitle_path(media_stem: &Path, track: &SubtitleTrack) -> PathBuf {
    let mut name = media_stem.as_os_str().to_owned();
    name.push(format!(
        ".{}.{}",
        utils::sanitize_file_name(&track.lang),
        utils::sanitize_file_name(&track.ext)
    ));
    PathBuf::from(name)
}

/// 下载全部语言的字幕，磁盘上已存在的语言直接跳过。
pub async fn fetch_subtitles(
    fetcher: &dyn MediaFetcher,
    client: &RobustClient,
    media_url: &str,
    media_stem: &Path,
) -> ArtifactStatus {
    let tracks = match fetcher.list_subtitles(media_url).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("获取字幕列表失败: {}", e);
            return ArtifactStatus::Failed(e.to_string());
        }
    };
    if tracks.is_empty() {
        debug!("该视频没有字幕");
        return ArtifactStatus::Absent;
    }

    let mut saved = Vec::new();
    let mut existing = 0;
    let mut errors = Vec::new();
    for track in &tracks {
        let dest = subtitle_path(media_stem, track);
        if dest.exists() {
            debug!("字幕已存在，跳过: {}", dest.display());
            existing += 1;
            continue;
        }
        match client.download_to_file(track.url.as_str(), &dest).await {
            Ok(_) => {
                info!("字幕已保存: {}", dest.display());
                saved.push(dest);
            }
            Err(e) => {
                warn!("字幕 '{}' 下载失败: {}", track.lang, e);
                errors.push(format!("{}: {}", track.lang, e));
            }
        }
    }

    if !errors.is_empty() {
        ArtifactStatus::Failed(format!("{}/{} 种字幕下载失败 ({})", errors.len(), tracks.len(), errors.join("; ")))
    } else if saved.is_empty() {
        ArtifactStatus::Skipped(format!("{} 种字幕均已存在", existing))
    } else {
        ArtifactStatus::Saved(saved)
    }
}
