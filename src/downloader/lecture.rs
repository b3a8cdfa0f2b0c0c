// src/downloader/lecture.rs

use super::{attachments, subtitles};
use crate::{
    CourseJobContext,
    auth::same_page,
    browser::{self, BrowserSession},
    client::RobustClient,
    config::AppConfig,
    constants::{selectors::lecture, timeouts},
    error::*,
    extractor::common::selector,
    media::MediaFetcher,
    models::{ArtifactKind, ArtifactStatus, LectureEntry, LectureOutcome, MediaDescriptor},
};
use log::{debug, error, info, warn};
use scraper::Html;
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use url::Url;

/// 勾选状态下点击一次即关闭自动播放
const DISABLE_AUTOPLAY_SCRIPT: &str = r#"
const el = document.querySelector(arguments[0]);
if (el && el.checked) { el.click(); return true; }
return false;
"#;

/// 逐个处理课时: 页面快照、附件、字幕、视频、完成标记。
/// 每一步都独立记录结果，任何一步失败都不会阻止后续步骤和后续课时。
pub struct LectureProcessor {
    session: Arc<dyn BrowserSession>,
    client: Arc<RobustClient>,
    fetcher: Arc<dyn MediaFetcher>,
    config: Arc<AppConfig>,
}

impl LectureProcessor {
    pub fn new(context: &CourseJobContext) -> Self {
        Self {
            session: context.session.clone(),
            client: context.http_client.clone(),
            fetcher: context.fetcher.clone(),
            config: context.config.clone(),
        }
    }

    pub async fn process(&self, entry: &LectureEntry) -> LectureOutcome {
        let mut outcome = LectureOutcome::new(entry.stem());
        info!("处理课时: {} ({})", entry.stem(), entry.link);

        if let Err(e) = self.open(&entry.link).await {
            error!("打开课时 '{}' 失败: {}", entry.stem(), e);
            outcome.record(ArtifactKind::Html, None, ArtifactStatus::Failed(e.to_string()));
            return outcome;
        }
        self.disable_autoplay().await;

        let source = self.session.page_source().await;
        outcome.record(ArtifactKind::Html, None, self.save_html(entry, &source));
        outcome.record(ArtifactKind::Attachments, None, self.save_attachments(entry, &source).await);
        self.save_media(entry, &mut outcome).await;

        if self.config.complete_lecture {
            outcome.record(ArtifactKind::Completion, None, self.mark_complete().await);
        }
        outcome
    }

    async fn open(&self, link: &str) -> AppResult<()> {
        let current = self.session.current_url().await?;
        if same_page(&current, link) {
            debug!("已在课时页面，无需跳转");
            return Ok(());
        }
        self.session.navigate(link).await
    }

    async fn disable_autoplay(&self) {
        match browser::is_present(&*self.session, lecture::AUTOPLAY_TOGGLE, timeouts::OPTIONAL_ELEMENT).await {
            Ok(true) => {
                match self
                    .session
                    .execute_script(DISABLE_AUTOPLAY_SCRIPT, vec![json!(lecture::AUTOPLAY_TOGGLE)])
                    .await
                {
                    Ok(Value::Bool(true)) => debug!("已关闭自动播放"),
                    Ok(_) => {}
                    Err(e) => debug!("关闭自动播放失败: {}", e),
                }
            }
            Ok(false) => {}
            Err(e) => debug!("检查自动播放开关失败: {}", e),
        }
    }

    fn save_html(&self, entry: &LectureEntry, source: &AppResult<String>) -> ArtifactStatus {
        let path = entry.html_path();
        let result = match source {
            Ok(html) => std::fs::write(&path, html).map_err(AppError::from),
            Err(e) => Err(AppError::Other(anyhow::anyhow!("无法读取页面源码: {}", e))),
        };
        match result {
            Ok(()) => ArtifactStatus::Saved(vec![path]),
            Err(e) => {
                error!("保存课时页面 '{}' 失败: {}", path.display(), e);
                ArtifactStatus::Failed(e.to_string())
            }
        }
    }

    async fn save_attachments(&self, entry: &LectureEntry, source: &AppResult<String>) -> ArtifactStatus {
        let Ok(source) = source else {
            return ArtifactStatus::Failed("无法读取页面源码".into());
        };
        let parsed = Url::parse(&entry.link)
            .map_err(AppError::from)
            .and_then(|url| attachments::parse_attachment_links(source, &url));
        match parsed {
            Ok(None) => {
                debug!("课时 '{}' 没有附件", entry.stem());
                ArtifactStatus::Absent
            }
            Ok(Some(links)) => {
                info!("课时 '{}' 有 {} 个附件", entry.stem(), links.len());
                attachments::download_attachments(&self.client, &links, &entry.attachments_dir()).await
            }
            Err(e) => {
                warn!("解析课时 '{}' 的附件失败: {}", entry.stem(), e);
                ArtifactStatus::Failed(e.to_string())
            }
        }
    }

    /// 依次处理页面中的每个播放器。播放器多于一个时产物名追加 `-N`。
    async fn save_media(&self, entry: &LectureEntry, outcome: &mut LectureOutcome) {
        let session = &*self.session;
        let wait = self.config.video_frame_timeout;

        match browser::is_present(session, lecture::VIDEO_FRAME, wait).await {
            Ok(true) => {}
            Ok(false) => {
                info!("课时 '{}' 中没有视频播放器", entry.stem());
                outcome.record(ArtifactKind::Video, None, ArtifactStatus::Absent);
                return;
            }
            Err(e) => {
                error!("查找课时 '{}' 的视频播放器失败: {}", entry.stem(), e);
                outcome.record(ArtifactKind::Video, None, ArtifactStatus::Failed(e.to_string()));
                return;
            }
        }
        let total = match session.frame_count(lecture::VIDEO_FRAME).await {
            Ok(n) => n,
            Err(e) => {
                error!("统计视频播放器数量失败: {}", e);
                outcome.record(ArtifactKind::Video, None, ArtifactStatus::Failed(e.to_string()));
                return;
            }
        };

        for index in 0..total {
            let number = index + 1;
            let frame = (total > 1).then_some(number);
            let descriptor =
                browser::within_frame(session, lecture::VIDEO_FRAME, index, wait, || read_descriptor(session, wait)).await;

            let descriptor = match descriptor {
                Ok(d) => d,
                Err(e @ AppError::ElementTimeout { .. }) => {
                    warn!("课时 '{}' 的第 {} 个播放器未在 {:?} 内就绪，跳过: {}", entry.stem(), number, wait, e);
                    let reason = format!("播放器未就绪: {}", e);
                    outcome.record(ArtifactKind::Subtitles, frame, ArtifactStatus::Skipped(reason.clone()));
                    outcome.record(ArtifactKind::Video, frame, ArtifactStatus::Skipped(reason));
                    continue;
                }
                Err(e) => {
                    error!("读取课时 '{}' 第 {} 个播放器的视频信息失败: {}", entry.stem(), number, e);
                    outcome.record(ArtifactKind::Subtitles, frame, ArtifactStatus::Skipped("缺少视频信息".into()));
                    outcome.record(ArtifactKind::Video, frame, ArtifactStatus::Failed(e.to_string()));
                    continue;
                }
            };

            let media_stem = entry.media_stem(number, total);
            let subs = subtitles::fetch_subtitles(&*self.fetcher, &self.client, &descriptor.url_encrypted, &media_stem).await;
            outcome.record(ArtifactKind::Subtitles, frame, subs);

            let video = match self.fetcher.fetch_video(&descriptor.url_encrypted, &media_stem).await {
                Ok(path) => {
                    info!("视频已保存: {}", path.display());
                    ArtifactStatus::Saved(vec![path])
                }
                Err(e) => {
                    error!("下载课时 '{}' 的视频失败: {}", entry.stem(), e);
                    ArtifactStatus::Failed(e.to_string())
                }
            };
            outcome.record(ArtifactKind::Video, frame, video);
        }
    }

    async fn mark_complete(&self) -> ArtifactStatus {
        match self.session.click(lecture::COMPLETE_BUTTON, timeouts::COMPLETE_BUTTON).await {
            Ok(()) => ArtifactStatus::Saved(Vec::new()),
            Err(AppError::ElementTimeout { .. }) => ArtifactStatus::Skipped("页面上没有完成按钮".into()),
            Err(e) => {
                warn!("标记课时完成失败: {}", e);
                ArtifactStatus::Failed(e.to_string())
            }
        }
    }
}

/// 在播放器 frame 内读取内嵌 JSON 中的视频信息
async fn read_descriptor(session: &dyn BrowserSession, wait: Duration) -> AppResult<MediaDescriptor> {
    session.wait_for(lecture::NEXT_DATA, wait).await?;
    let source = session.page_source().await?;
    parse_media_descriptor(&source)
}

pub fn parse_media_descriptor(source: &str) -> AppResult<MediaDescriptor> {
    let doc = Html::parse_document(source);
    let script = doc
        .select(&selector(lecture::NEXT_DATA)?)
        .next()
        .ok_or_else(|| AppError::MediaDescriptorMissing("页面中没有内嵌数据脚本".into()))?;
    let data: Value = serde_json::from_str(&script.text().collect::<String>())?;
    MediaDescriptor::from_next_data(&data).ok_or_else(|| AppError::MediaDescriptorMissing("内嵌数据中没有视频地址".into()))
}
