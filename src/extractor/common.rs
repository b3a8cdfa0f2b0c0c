// src/extractor/common.rs

use super::{CurriculumExtractor, CurriculumMarkers};
use crate::{
    browser::{self, BrowserSession},
    client::RobustClient,
    constants::{self, selectors, timeouts},
    error::*,
    models::{Chapter, LectureEntry, LectureManifest},
    utils,
};
use log::{debug, error, info, warn};
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use url::Url;

pub fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|_| AppError::Selector(css.to_string()))
}

/// 元素内全部文本，空白已折叠
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn first_text(scope: ElementRef<'_>, css: &str) -> AppResult<Option<String>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next().map(text_of).filter(|t| !t.is_empty()))
}

/// 两级遍历: 章节容器 -> 课时链接。
/// 带锁定标记的章节整章跳过，但仍占用一个章节序号。
pub fn walk_sections<F>(
    doc: &Html,
    markers: &CurriculumMarkers,
    base_url: &Url,
    course_dir: &Path,
    clean_title: F,
) -> AppResult<(Vec<Chapter>, Vec<LectureEntry>)>
where
    F: Fn(&str) -> String,
{
    let section_sel = selector(markers.section)?;
    let lecture_sel = selector(markers.lecture)?;
    let locked_sel = markers.section_locked.map(selector).transpose()?;

    let mut chapters = Vec::new();
    let mut entries = Vec::new();

    for (position, section) in doc.select(&section_sel).enumerate() {
        let index = position + 1;
        let raw_title = first_text(section, markers.section_title)?.unwrap_or_else(|| format!("Chapter {}", index));

        if let Some(locked_sel) = &locked_sel
            && section.select(locked_sel).next().is_some()
        {
            info!("章节 '{}' 尚未开放，跳过", raw_title);
            continue;
        }

        let chapter = Chapter::new(index, &raw_title, course_dir);
        debug!("章节 {}: {}", index, chapter.title);

        let mut sequence = 0;
        for row in section.select(&lecture_sel) {
            let Some(href) = row.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
                warn!("章节 '{}' 中有一个课时缺少链接，跳过", chapter.title);
                continue;
            };
            let link = match base_url.join(href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    warn!("无法解析课时链接 '{}': {}", href, e);
                    continue;
                }
            };
            let raw = first_text(row, markers.lecture_title)?.unwrap_or_else(|| text_of(row));
            sequence += 1;
            entries.push(LectureEntry::new(link, &clean_title(&raw), sequence, &chapter.output_dir));
        }
        chapters.push(chapter);
    }
    Ok((chapters, entries))
}

/// 从页面中读取课程标题，找不到模板标记时回退到 og:title
pub fn course_title(doc: &Html, title_selector: &str) -> AppResult<Option<String>> {
    if let Some(title) = first_text(doc.root_element(), title_selector)? {
        return Ok(Some(title));
    }
    let og = selector(selectors::OG_TITLE)?;
    Ok(doc
        .select(&og)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// 课程封面图地址，找不到模板标记时回退到 og:image
pub fn course_image_url(doc: &Html, image_selector: &str, base_url: &Url) -> AppResult<Option<Url>> {
    let img = selector(image_selector)?;
    let og = selector(selectors::OG_IMAGE)?;
    let src = doc
        .select(&img)
        .next()
        .and_then(|e| e.value().attr("src"))
        .or_else(|| doc.select(&og).next().and_then(|m| m.value().attr("content")));
    Ok(src.and_then(|s| base_url.join(s.trim()).ok()))
}

/// 页面解析结果，不持有 DOM 以便跨越 await
struct ParsedCourse {
    title: String,
    image_url: Option<Url>,
    chapters: Vec<Chapter>,
    entries: Vec<LectureEntry>,
    course_dir: PathBuf,
}

fn parse_course_page(
    extractor: &dyn CurriculumExtractor,
    source: &str,
    base_url: &Url,
    output_root: &Path,
) -> AppResult<ParsedCourse> {
    let doc = Html::parse_document(source);
    let title = course_title(&doc, extractor.course_title_selector())?.ok_or(AppError::CourseTitleNotFound)?;
    let course_dir = output_root.join(utils::course_dir_name(&title));
    let image_url = course_image_url(&doc, extractor.course_image_selector(), base_url)?;
    let (chapters, entries) = extractor.walk(&doc, base_url, &course_dir)?;
    Ok(ParsedCourse { title, image_url, chapters, entries, course_dir })
}

/// 解析当前课程页面: 生成课时清单、创建章节目录、保存课程页快照与封面图。
pub async fn extract_manifest(
    extractor: &dyn CurriculumExtractor,
    session: &dyn BrowserSession,
    client: &RobustClient,
    course_url: &Url,
    output_root: &Path,
) -> AppResult<LectureManifest> {
    extractor.prepare_page(session).await?;

    if !browser::is_present(session, extractor.course_title_selector(), timeouts::COURSE_TITLE).await? {
        warn!("未找到 {} 模板的课程标题元素，尝试使用备用标题", extractor.template().name());
    }

    let source = session.page_source().await?;
    let parsed = parse_course_page(extractor, &source, course_url, output_root)?;
    info!(
        "课程 '{}': {} 个章节, {} 个课时",
        parsed.title,
        parsed.chapters.len(),
        parsed.entries.len()
    );

    let manifest = LectureManifest {
        template: extractor.template(),
        course_title: parsed.title,
        course_dir: parsed.course_dir,
        chapters: parsed.chapters,
        entries: parsed.entries,
    };
    manifest.create_directories()?;

    let snapshot = manifest.course_dir.join(constants::COURSE_SNAPSHOT_NAME);
    if let Err(e) = std::fs::write(&snapshot, &source) {
        error!("保存课程页快照 '{}' 失败: {}", snapshot.display(), e);
    }

    match parsed.image_url {
        Some(url) => save_course_image(client, &url, &manifest.course_dir).await,
        None => warn!("课程 '{}' 未找到封面图", manifest.course_title),
    }

    Ok(manifest)
}

/// 先尝试去掉缩放指令的高清地址，失败后回退到原地址
pub async fn save_course_image(client: &RobustClient, url: &Url, course_dir: &Path) {
    let dest = course_dir.join(constants::COURSE_IMAGE_NAME);
    let mut candidates: Vec<String> = Vec::new();
    if let Some(hd) = utils::hd_image_url(url.as_str()) {
        candidates.push(hd);
    }
    candidates.push(url.to_string());

    for candidate in &candidates {
        match client.download_to_file(candidate.as_str(), &dest).await {
            Ok(_) => {
                debug!("封面图已保存: {}", candidate);
                return;
            }
            Err(e) => warn!("下载封面图 '{}' 失败: {}", candidate, e),
        }
    }
    error!("课程封面图下载失败: {}", url);
}
