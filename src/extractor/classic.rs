// src/extractor/classic.rs

use super::{CurriculumExtractor, CurriculumMarkers};
use crate::{constants::selectors::classic, models::Template};
use regex::Regex;
use std::sync::LazyLock;

// 课时名后附带的时长，如 "Welcome (3:45)"
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\d{1,2}(:\d{2}){1,2}\)\s*$").unwrap());

/// 经典侧边栏模板
pub struct ClassicExtractor;

impl CurriculumExtractor for ClassicExtractor {
    fn template(&self) -> Template {
        Template::Classic
    }

    fn course_title_selector(&self) -> &'static str {
        classic::COURSE_TITLE
    }

    fn course_image_selector(&self) -> &'static str {
        classic::COURSE_IMAGE
    }

    fn markers(&self) -> CurriculumMarkers {
        CurriculumMarkers {
            section: classic::SECTION,
            section_title: classic::SECTION_TITLE,
            lecture: classic::LECTURE,
            lecture_title: classic::LECTURE_TITLE,
            section_locked: None,
        }
    }

    fn clean_lecture_title(&self, raw: &str) -> String {
        DURATION_RE.replace(raw.trim(), "").into_owned()
    }
}
