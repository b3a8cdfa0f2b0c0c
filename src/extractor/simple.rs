// src/extractor/simple.rs

use super::{CurriculumExtractor, CurriculumMarkers};
use crate::{constants::selectors::simple, models::Template};

/// 新版单页应用模板。章节可能被锁定 (按期解锁的内容)。
pub struct SimpleExtractor;

impl CurriculumExtractor for SimpleExtractor {
    fn template(&self) -> Template {
        Template::Simple
    }

    fn course_title_selector(&self) -> &'static str {
        simple::COURSE_TITLE
    }

    fn course_image_selector(&self) -> &'static str {
        simple::COURSE_IMAGE
    }

    fn markers(&self) -> CurriculumMarkers {
        CurriculumMarkers {
            section: simple::SECTION,
            section_title: simple::SECTION_TITLE,
            lecture: simple::LECTURE,
            lecture_title: simple::LECTURE_TITLE,
            section_locked: Some(simple::SECTION_LOCKED),
        }
    }
}
