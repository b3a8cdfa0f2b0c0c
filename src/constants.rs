// src/constants.rs

use std::time::Duration;

pub const UI_WIDTH: usize = 88;
/// 文件系统允许的最大文件名字节数
pub const MAX_FILENAME_BYTES: usize = 255;
/// 课时产物可能出现的最长后缀 (多播放器编号 + yt-dlp 分片临时文件)
pub const LONGEST_ARTIFACT_SUFFIX: &str = "-99.f999.mp4.part-Frag99999.part";
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const DEFAULT_SAVE_DIR: &str = "courses";
pub const COURSE_SNAPSHOT_NAME: &str = "course.html";
pub const COURSE_IMAGE_NAME: &str = "course-image.jpg";
pub const UNTITLED: &str = "untitled";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_MEDIA_REFERER: &str = "https://cf-embed.play.hotmart.com/";
pub const DEFAULT_SUBTITLE_EXT: &str = "vtt";
pub const DEFAULT_CONCURRENT_FRAGMENTS: u32 = 4;

/// 页面内嵌 JSON 中加密视频地址的固定路径
pub const MEDIA_DESCRIPTOR_POINTER: &str = "/props/pageProps/applicationData/mediaAssets/0/urlEncrypted";

pub mod timeouts {
    use super::Duration;

    pub const LOGIN_FIELD: Duration = Duration::from_secs(10);
    pub const LOGIN_SUBMIT: Duration = Duration::from_secs(30);
    pub const COURSE_TITLE: Duration = Duration::from_secs(10);
    pub const VIDEO_FRAME: Duration = Duration::from_secs(15);
    pub const OPTIONAL_ELEMENT: Duration = Duration::from_millis(100);
    pub const COMPLETE_BUTTON: Duration = Duration::from_secs(5);
    pub const PAGE_LOAD: Duration = Duration::from_secs(60);
    pub const POLL_INTERVAL: Duration = Duration::from_millis(250);
    pub const MANUAL_LOGIN_POLL: Duration = Duration::from_secs(1);
}

/// 三种课程页面模板的结构标记
pub mod selectors {
    pub mod simple {
        pub const ROOT: &str = "div.course-curriculum__container";
        pub const COURSE_TITLE: &str = "h1.course-curriculum__title";
        pub const COURSE_IMAGE: &str = "img.course-curriculum__image";
        pub const SECTION: &str = "div.course-curriculum__chapter";
        pub const SECTION_TITLE: &str = "h2.course-curriculum__chapter-title";
        pub const SECTION_LOCKED: &str = ".course-curriculum__chapter-lock";
        pub const LECTURE: &str = "a.course-curriculum__chapter-lesson";
        pub const LECTURE_TITLE: &str = ".course-curriculum__chapter-lesson-title";
    }

    pub mod classic {
        pub const ROOT: &str = "div.course-sidebar";
        pub const COURSE_TITLE: &str = "div.course-sidebar h2";
        pub const COURSE_IMAGE: &str = "img.course-image";
        pub const SECTION: &str = "div.course-section";
        pub const SECTION_TITLE: &str = "div.section-title";
        pub const LECTURE: &str = "li.section-item a.item";
        pub const LECTURE_TITLE: &str = "span.lecture-name";
    }

    pub mod colossal {
        pub const ROOT: &str = "div.block__curriculum";
        pub const COURSE_TITLE: &str = "h1.block__hero__title";
        pub const COURSE_IMAGE: &str = "img.block__hero__image";
        pub const SECTION: &str = "div.block__curriculum__section";
        pub const SECTION_TITLE: &str = "div.block__curriculum__section__title";
        pub const LECTURE: &str = "a.block__curriculum__section__list__item__link";
        pub const LECTURE_TITLE: &str = "span.block__curriculum__section__list__item__title";
        pub const HIDDEN_CLASS: &str = "hidden";
    }

    pub mod login {
        pub const EMAIL: &str = "#email";
        pub const PASSWORD: &str = "#password";
        pub const SUBMIT: &str = "[name='commit']";
        pub const LINK_TEXT: &str = "login";
    }

    pub mod lecture {
        pub const AUTOPLAY_TOGGLE: &str = "#custom-toggle-autoplay";
        pub const ATTACHMENTS: &str = "div.lecture-attachment-type-file";
        pub const ATTACHMENT_LINK: &str = "a[href]";
        pub const VIDEO_FRAME: &str = "iframe[src*='hotmart']";
        pub const NEXT_DATA: &str = "script#__NEXT_DATA__";
        pub const COMPLETE_BUTTON: &str = "#lecture_complete_button";
    }

    pub const OG_TITLE: &str = "meta[property='og:title']";
    pub const OG_IMAGE: &str = "meta[property='og:image']";
}
