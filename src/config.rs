// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<(u32, u32)>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            window_size: Some((1366, 900)),
        }
    }
}

// --- 为上面的 serde default 添加辅助函数 ---
fn default_webdriver_url() -> String {
    constants::DEFAULT_WEBDRIVER_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MediaConfig {
    pub ytdlp_path: Option<PathBuf>,
    pub concurrent_fragments: Option<u32>,
    pub referer: Option<String>,
    pub preferred_subtitle_ext: Option<String>,
}

/// 以秒为单位的等待时间，未设置的项使用内置默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimeoutConfig {
    pub login_field_secs: Option<u64>,
    pub video_frame_secs: Option<u64>,
    pub manual_login_poll_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            browser: BrowserConfig::default(),
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                user_agent: None,
            },
            media: MediaConfig {
                ytdlp_path: None,
                concurrent_fragments: Some(constants::DEFAULT_CONCURRENT_FRAGMENTS),
                referer: Some(constants::DEFAULT_MEDIA_REFERER.into()),
                preferred_subtitle_ext: Some(constants::DEFAULT_SUBTITLE_EXT.into()),
            },
            timeouts: TimeoutConfig {
                login_field_secs: Some(constants::timeouts::LOGIN_FIELD.as_secs()),
                video_frame_secs: Some(constants::timeouts::VIDEO_FRAME.as_secs()),
                manual_login_poll_secs: Some(constants::timeouts::MANUAL_LOGIN_POLL.as_secs()),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_root: PathBuf,
    pub webdriver_url: String,
    pub headless: bool,
    pub window_size: Option<(u32, u32)>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub ytdlp_path: PathBuf,
    pub concurrent_fragments: u32,
    pub media_referer: String,
    pub preferred_subtitle_ext: String,
    pub login_field_timeout: Duration,
    pub video_frame_timeout: Duration,
    pub manual_login_poll: Duration,
    pub complete_lecture: bool,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Ok(Self::merge(args, external_config))
    }

    /// 命令行参数优先于配置文件
    pub fn merge(args: &Cli, external: ExternalConfig) -> Self {
        let secs_or = |v: Option<u64>, d: Duration| v.map(Duration::from_secs).unwrap_or(d);
        Self {
            output_root: args.output.clone(),
            webdriver_url: args
                .webdriver_url
                .clone()
                .unwrap_or(external.browser.webdriver_url),
            headless: args.headless || external.browser.headless,
            window_size: external.browser.window_size,
            user_agent: external
                .network
                .user_agent
                .unwrap_or_else(|| constants::USER_AGENT.into()),
            connect_timeout: Duration::from_secs(external.network.connect_timeout_secs.unwrap_or(10)),
            timeout: Duration::from_secs(external.network.timeout_secs.unwrap_or(60)),
            ytdlp_path: args
                .ytdlp
                .clone()
                .or(external.media.ytdlp_path)
                .unwrap_or_else(|| PathBuf::from(default_ytdlp_bin())),
            concurrent_fragments: external
                .media
                .concurrent_fragments
                .unwrap_or(constants::DEFAULT_CONCURRENT_FRAGMENTS)
                .max(1),
            media_referer: external
                .media
                .referer
                .unwrap_or_else(|| constants::DEFAULT_MEDIA_REFERER.into()),
            preferred_subtitle_ext: external
                .media
                .preferred_subtitle_ext
                .unwrap_or_else(|| constants::DEFAULT_SUBTITLE_EXT.into()),
            login_field_timeout: secs_or(external.timeouts.login_field_secs, constants::timeouts::LOGIN_FIELD),
            video_frame_timeout: secs_or(external.timeouts.video_frame_secs, constants::timeouts::VIDEO_FRAME),
            manual_login_poll: secs_or(
                external.timeouts.manual_login_poll_secs,
                constants::timeouts::MANUAL_LOGIN_POLL,
            ),
            complete_lecture: args.complete_lecture,
        }
    }
}

fn default_ytdlp_bin() -> &'static str {
    if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(constants::DEFAULT_SAVE_DIR),
            webdriver_url: constants::DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            window_size: None,
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            ytdlp_path: PathBuf::from(default_ytdlp_bin()),
            concurrent_fragments: 1,
            media_referer: constants::DEFAULT_MEDIA_REFERER.to_string(),
            preferred_subtitle_ext: constants::DEFAULT_SUBTITLE_EXT.to_string(),
            login_field_timeout: Duration::from_millis(200),
            video_frame_timeout: Duration::from_millis(200),
            manual_login_poll: Duration::from_millis(10),
            complete_lecture: false,
        }
    }
}
