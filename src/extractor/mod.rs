// src/extractor/mod.rs

pub mod classic;
pub mod classifier;
pub mod colossal;
pub mod common;
pub mod simple;

use crate::{
    browser::BrowserSession,
    error::*,
    models::{Chapter, LectureEntry, Template},
};
use async_trait::async_trait;
use scraper::Html;
use std::path::Path;
use url::Url;

/// 一种页面模板的课程目录结构标记
#[derive(Debug, Clone, Copy)]
pub struct CurriculumMarkers {
    pub section: &'static str,
    pub section_title: &'static str,
    pub lecture: &'static str,
    pub lecture_title: &'static str,
    /// 章节被锁定 (尚未开放) 的标记，仅部分模板存在
    pub section_locked: Option<&'static str>,
}

/// 课程目录解析器，每种模板一个实现
#[async_trait]
pub trait CurriculumExtractor: Send + Sync {
    fn template(&self) -> Template;

    fn course_title_selector(&self) -> &'static str;

    fn course_image_selector(&self) -> &'static str;

    fn markers(&self) -> CurriculumMarkers;

    /// 读取 DOM 之前对页面做必要的调整
    async fn prepare_page(&self, _session: &dyn BrowserSession) -> AppResult<()> {
        Ok(())
    }

    /// 课时标题的额外清理
    fn clean_lecture_title(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    /// 遍历章节与课时，生成有序的章节列表与课时清单
    fn walk(&self, doc: &Html, base_url: &Url, course_dir: &Path) -> AppResult<(Vec<Chapter>, Vec<LectureEntry>)> {
        common::walk_sections(doc, &self.markers(), base_url, course_dir, |raw| {
            self.clean_lecture_title(raw)
        })
    }
}

pub fn extractor_for(template: Template) -> Box<dyn CurriculumExtractor> {
    match template {
        Template::Simple => Box::new(simple::SimpleExtractor),
        Template::Classic => Box::new(classic::ClassicExtractor),
        Template::Colossal => Box::new(colossal::ColossalExtractor),
    }
}
