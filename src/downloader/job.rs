// src/downloader/job.rs

use super::{CourseReport, lecture::LectureProcessor};
use crate::{
    CourseJobContext,
    constants::timeouts,
    error::*,
    extractor::{self, classifier},
    models::LectureManifest,
    symbols, ui, utils,
};
use log::{debug, info};
use url::Url;

/// 一门课程的完整流程: 登录 -> 识别模板 -> 解析课时清单 -> 逐个处理课时
pub struct CourseDownloader {
    context: CourseJobContext,
}

impl CourseDownloader {
    pub fn new(context: CourseJobContext) -> Self {
        Self { context }
    }

    pub async fn run(&self, course_url: &str) -> AppResult<CourseReport> {
        info!("开始处理课程: {}", course_url);
        let course_url = Url::parse(course_url.trim())
            .map_err(|e| AppError::UserInputError(format!("无效的课程链接 '{}': {}", course_url, e)))?;
        let session = &*self.context.session;

        self.context
            .auth
            .lock()
            .await
            .ensure_authenticated(session, &self.context.http_client, &course_url)
            .await?;

        session.navigate(course_url.as_str()).await?;
        let template = classifier::detect_template(session, timeouts::COURSE_TITLE).await?;
        let extractor = extractor::extractor_for(template);
        let manifest = extractor::common::extract_manifest(
            extractor.as_ref(),
            session,
            &self.context.http_client,
            &course_url,
            &self.context.config.output_root,
        )
        .await?;

        let location = dunce::canonicalize(&manifest.course_dir).unwrap_or_else(|_| manifest.course_dir.clone());
        println!(
            "\n{} 课程 '{}' ({} 模板): {} 个章节, {} 个课时",
            *symbols::INFO,
            manifest.course_title,
            template.name(),
            manifest.chapters.len(),
            manifest.entries.len()
        );
        println!("{} 文件将保存到目录: \"{}\"", *symbols::INFO, location.display());

        Ok(self.process_lectures(&manifest).await)
    }

    async fn process_lectures(&self, manifest: &LectureManifest) -> CourseReport {
        let mut report = CourseReport::new(&manifest.course_title);
        if manifest.entries.is_empty() {
            ui::warn("课程中没有可处理的课时。");
            return report;
        }

        let processor = LectureProcessor::new(&self.context);
        let pbar = ui::new_lectures_progress_bar(manifest.entries.len() as u64, "课时");
        for entry in &manifest.entries {
            pbar.set_message(utils::truncate_text(&entry.stem(), 50));
            let outcome = processor.process(entry).await;
            debug!("课时 '{}' 处理结果: {:?}", entry.stem(), outcome.artifacts);

            let symbol = if outcome.failures().next().is_some() { &*symbols::WARN } else { &*symbols::OK };
            let chapter = entry
                .chapter_output_dir
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let artifacts = outcome
                .artifacts
                .iter()
                .map(|a| format!("{}{}", a.kind.label(), a.status.symbol()))
                .collect::<Vec<_>>()
                .join(" ");
            pbar.println(format!("{} {}/{}  {}", symbol, chapter, outcome.stem, artifacts));
            report.record(&outcome);
            pbar.inc(1);
        }
        pbar.finish_and_clear();

        report.print();
        report
    }
}
