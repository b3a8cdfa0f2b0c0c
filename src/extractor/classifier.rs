// src/extractor/classifier.rs

use super::common::selector;
use crate::{
    browser::BrowserSession,
    constants::{selectors, timeouts},
    error::*,
    models::Template,
};
use log::{debug, info};
use scraper::Html;
use std::time::{Duration, Instant};

/// 按固定优先级检查的模板标记，先匹配者胜出
const TEMPLATE_MARKERS: [(Template, &str); 3] = [
    (Template::Simple, selectors::simple::ROOT),
    (Template::Classic, selectors::classic::ROOT),
    (Template::Colossal, selectors::colossal::ROOT),
];

/// 根据页面结构标记判断模板
pub fn classify(doc: &Html) -> AppResult<Option<Template>> {
    for (template, marker) in TEMPLATE_MARKERS {
        if doc.select(&selector(marker)?).next().is_some() {
            return Ok(Some(template));
        }
    }
    Ok(None)
}

pub fn classify_source(source: &str) -> AppResult<Option<Template>> {
    classify(&Html::parse_document(source))
}

/// 在超时前反复检查当前页面，页面仍在渲染时也能识别
pub async fn detect_template(session: &dyn BrowserSession, timeout: Duration) -> AppResult<Template> {
    let deadline = Instant::now() + timeout;
    loop {
        let source = session.page_source().await?;
        if let Some(template) = classify_source(&source)? {
            info!("识别到课程页面模板: {}", template.name());
            return Ok(template);
        }
        if Instant::now() >= deadline {
            let url = session.current_url().await.unwrap_or_default();
            return Err(AppError::UnsupportedTemplate(url));
        }
        debug!("尚未识别出页面模板，继续等待...");
        tokio::time::sleep(timeouts::POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_marker() {
        let simple = r#"<html><body><div class="course-curriculum__container"></div></body></html>"#;
        let classic = r#"<html><body><div class="course-sidebar"></div></body></html>"#;
        let colossal = r#"<html><body><div class="block__curriculum"></div></body></html>"#;
        assert_eq!(classify_source(simple).unwrap(), Some(Template::Simple));
        assert_eq!(classify_source(classic).unwrap(), Some(Template::Classic));
        assert_eq!(classify_source(colossal).unwrap(), Some(Template::Colossal));
        assert_eq!(classify_source("<html><body><p>nothing</p></body></html>").unwrap(), None);
    }

    #[test]
    fn test_earlier_marker_wins_when_several_match() {
        let both = r#"<div class="block__curriculum"></div><div class="course-sidebar"></div>"#;
        assert_eq!(classify_source(both).unwrap(), Some(Template::Classic));
    }
}
