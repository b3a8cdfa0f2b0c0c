// src/extractor/colossal.rs

use super::{CurriculumExtractor, CurriculumMarkers};
use crate::{browser::BrowserSession, constants::selectors::colossal, error::*, models::Template};
use async_trait::async_trait;
use log::debug;
use serde_json::json;

/// 折叠的章节带有 hidden 样式，必须先全部展开才能读取
const REVEAL_SCRIPT: &str = r#"
const cls = arguments[0];
const nodes = document.querySelectorAll('.' + cls);
nodes.forEach(n => n.classList.remove(cls));
return nodes.length;
"#;

/// Colossal 区块模板
pub struct ColossalExtractor;

#[async_trait]
impl CurriculumExtractor for ColossalExtractor {
    fn template(&self) -> Template {
        Template::Colossal
    }

    fn course_title_selector(&self) -> &'static str {
        colossal::COURSE_TITLE
    }

    fn course_image_selector(&self) -> &'static str {
        colossal::COURSE_IMAGE
    }

    fn markers(&self) -> CurriculumMarkers {
        CurriculumMarkers {
            section: colossal::SECTION,
            section_title: colossal::SECTION_TITLE,
            lecture: colossal::LECTURE,
            lecture_title: colossal::LECTURE_TITLE,
            section_locked: None,
        }
    }

    async fn prepare_page(&self, session: &dyn BrowserSession) -> AppResult<()> {
        let revealed = session
            .execute_script(REVEAL_SCRIPT, vec![json!(colossal::HIDDEN_CLASS)])
            .await?;
        debug!("已展开 {} 个隐藏元素", revealed);
        Ok(())
    }
}
