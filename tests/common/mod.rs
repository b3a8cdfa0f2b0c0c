// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use course_dl::{
    CourseJobContext,
    browser::BrowserSession,
    cli::AuthStrategy,
    client::RobustClient,
    config::AppConfig,
    error::{AppError, AppResult},
    media::{MediaFetcher, SubtitleTrack},
};
use scraper::{Html, Selector};
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

/// 登录后页面。手动登录策略指向此地址，打开即视为已登录。
pub const ENROLLED_URL: &str = "https://school.example.com/courses/enrolled";

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub source: String,
    /// 每个播放器 frame 的文档。`None` 表示该 frame 始终没有就绪。
    pub frames: Vec<Option<String>>,
}

impl FakePage {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), frames: Vec::new() }
    }

    pub fn with_frames(source: impl Into<String>, frames: Vec<Option<String>>) -> Self {
        Self { source: source.into(), frames }
    }
}

#[derive(Debug, Default)]
struct BrowserState {
    current_url: String,
    frame: Option<usize>,
    navigations: Vec<String>,
    scripts: Vec<(String, Vec<Value>)>,
    clicks: Vec<String>,
    frames_entered: usize,
    frames_left: usize,
    url_reads: usize,
    /// (剩余读取次数, 目标地址): 读取地址若干次后浏览器自行跳转，模拟用户手动登录
    pending_arrival: Option<(usize, String)>,
    shut_down: bool,
}

/// 基于预置页面源码的浏览器会话，元素查询通过 scraper 完成
#[derive(Default)]
pub struct FakeBrowser {
    pages: Mutex<HashMap<String, FakePage>>,
    redirects: Mutex<HashMap<String, String>>,
    click_targets: Mutex<HashMap<String, String>>,
    script_responses: Mutex<Vec<(String, Value)>>,
    state: Mutex<BrowserState>,
}

fn count_matches(source: &str, css: &str) -> AppResult<usize> {
    let sel = Selector::parse(css).map_err(|_| AppError::Selector(css.to_string()))?;
    Ok(Html::parse_document(source).select(&sel).count())
}

fn timeout_error(selector: &str, timeout: Duration) -> AppError {
    AppError::ElementTimeout { selector: selector.to_string(), timeout }
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        let browser = Arc::new(Self::default());
        browser.add_page(ENROLLED_URL, FakePage::new("<html><body>My courses</body></html>"));
        browser
    }

    pub fn add_page(&self, url: &str, page: FakePage) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    /// 打开 `from` 时实际落在 `to` (例如未登录时被重定向到登录页)
    pub fn redirect(&self, from: &str, to: &str) {
        self.redirects.lock().unwrap().insert(from.to_string(), to.to_string());
    }

    /// 点击 `selector` 后跳转到 `url`
    pub fn navigate_on_click(&self, selector: &str, url: &str) {
        self.click_targets.lock().unwrap().insert(selector.to_string(), url.to_string());
    }

    /// 脚本源码包含 `fragment` 时返回 `value`，其余脚本返回 `false`
    pub fn respond_to_script(&self, fragment: &str, value: Value) {
        self.script_responses.lock().unwrap().push((fragment.to_string(), value));
    }

    /// 前 `reads` 次读取地址保持不变，之后浏览器停留在 `url`
    pub fn arrive_after_reads(&self, reads: usize, url: &str) {
        self.state.lock().unwrap().pending_arrival = Some((reads, url.to_string()));
    }

    pub fn url_reads(&self) -> usize {
        self.state.lock().unwrap().url_reads
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn scripts(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().scripts.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    /// (进入次数, 离开次数)
    pub fn frame_balance(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.frames_entered, state.frames_left)
    }

    pub fn in_frame(&self) -> bool {
        self.state.lock().unwrap().frame.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().unwrap().shut_down
    }

    fn current_page(&self) -> Option<FakePage> {
        let url = self.state.lock().unwrap().current_url.clone();
        self.pages.lock().unwrap().get(&url).cloned()
    }

    fn current_source(&self) -> String {
        let frame = self.state.lock().unwrap().frame;
        let Some(page) = self.current_page() else {
            return String::new();
        };
        match frame {
            Some(i) => page.frames.get(i).cloned().flatten().unwrap_or_default(),
            None => page.source,
        }
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        let landed = self.redirects.lock().unwrap().get(url).cloned().unwrap_or_else(|| url.to_string());
        if !self.pages.lock().unwrap().contains_key(&landed) {
            return Err(AppError::Other(anyhow::anyhow!("页面不存在: {}", url)));
        }
        let mut state = self.state.lock().unwrap();
        state.current_url = landed;
        state.frame = None;
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        let mut state = self.state.lock().unwrap();
        state.url_reads += 1;
        match state.pending_arrival.take() {
            Some((0, url)) => state.current_url = url,
            Some((remaining, url)) => state.pending_arrival = Some((remaining - 1, url)),
            None => {}
        }
        Ok(state.current_url.clone())
    }

    async fn page_source(&self) -> AppResult<String> {
        Ok(self.current_source())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> AppResult<()> {
        if count_matches(&self.current_source(), selector)? > 0 {
            Ok(())
        } else {
            Err(timeout_error(selector, timeout))
        }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> AppResult<Value> {
        self.state.lock().unwrap().scripts.push((script.to_string(), args));
        let response = self
            .script_responses
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone());
        Ok(response.unwrap_or(json!(false)))
    }

    async fn click(&self, selector: &str, timeout: Duration) -> AppResult<()> {
        self.wait_for(selector, timeout).await?;
        self.state.lock().unwrap().clicks.push(selector.to_string());
        let target = self.click_targets.lock().unwrap().get(selector).cloned();
        if let Some(url) = target {
            self.navigate(&url).await?;
        }
        Ok(())
    }

    async fn frame_count(&self, selector: &str) -> AppResult<usize> {
        let source = self.current_page().map(|p| p.source).unwrap_or_default();
        count_matches(&source, selector)
    }

    async fn enter_frame(&self, selector: &str, index: usize, timeout: Duration) -> AppResult<()> {
        let ready = self
            .current_page()
            .and_then(|p| p.frames.get(index).cloned().flatten())
            .is_some();
        let mut state = self.state.lock().unwrap();
        if !ready {
            return Err(timeout_error(selector, timeout));
        }
        state.frame = Some(index);
        state.frames_entered += 1;
        Ok(())
    }

    async fn leave_frame(&self) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.frame = None;
        state.frames_left += 1;
        Ok(())
    }

    async fn cookies(&self) -> AppResult<Vec<(String, String)>> {
        Ok(vec![("_session_id".to_string(), "fake-session".to_string())])
    }

    async fn shutdown(&self) -> AppResult<()> {
        self.state.lock().unwrap().shut_down = true;
        Ok(())
    }
}

/// 按媒体地址返回预置结果的媒体下载器。视频“下载”即写入一个小文件。
#[derive(Default)]
pub struct FakeMediaFetcher {
    pub subtitles: Mutex<HashMap<String, Vec<SubtitleTrack>>>,
    pub failing_videos: Mutex<HashSet<String>>,
    pub failing_subtitles: Mutex<HashSet<String>>,
    pub video_calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeMediaFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_subtitles(&self, media_url: &str, tracks: Vec<SubtitleTrack>) {
        self.subtitles.lock().unwrap().insert(media_url.to_string(), tracks);
    }

    pub fn fail_video(&self, media_url: &str) {
        self.failing_videos.lock().unwrap().insert(media_url.to_string());
    }

    pub fn fail_subtitles(&self, media_url: &str) {
        self.failing_subtitles.lock().unwrap().insert(media_url.to_string());
    }

    pub fn video_calls(&self) -> Vec<(String, PathBuf)> {
        self.video_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeMediaFetcher {
    async fn list_subtitles(&self, media_url: &str) -> AppResult<Vec<SubtitleTrack>> {
        if self.failing_subtitles.lock().unwrap().contains(media_url) {
            return Err(AppError::MediaFetcher { status: "exit status: 1".into(), stderr: "ERROR: 403".into() });
        }
        Ok(self.subtitles.lock().unwrap().get(media_url).cloned().unwrap_or_default())
    }

    async fn fetch_video(&self, media_url: &str, output_stem: &Path) -> AppResult<PathBuf> {
        self.video_calls
            .lock()
            .unwrap()
            .push((media_url.to_string(), output_stem.to_path_buf()));
        if self.failing_videos.lock().unwrap().contains(media_url) {
            return Err(AppError::MediaFetcher { status: "exit status: 1".into(), stderr: "ERROR: fragment 1 not found".into() });
        }
        let mut name = output_stem.as_os_str().to_owned();
        name.push(".mp4");
        let path = PathBuf::from(name);
        std::fs::write(&path, b"fake video")?;
        Ok(path)
    }
}

/// 课时页面源码: 可选附件区域与若干播放器 iframe
pub fn lecture_page(attachments: &[(&str, &str)], frame_count: usize, with_complete_button: bool) -> String {
    let mut body = String::from("<div class=\"lecture-content\"><h2>Lecture</h2>");
    body.push_str("<input type=\"checkbox\" id=\"custom-toggle-autoplay\" checked>");
    if !attachments.is_empty() {
        body.push_str("<div class=\"lecture-attachment-type-file\">");
        for (href, text) in attachments {
            body.push_str(&format!("<a href=\"{}\">{}</a>", href, text));
        }
        body.push_str("</div>");
    }
    for i in 0..frame_count {
        body.push_str(&format!(
            "<iframe src=\"https://player.hotmart.com/embed/{}?signature=x\"></iframe>",
            i + 1
        ));
    }
    if with_complete_button {
        body.push_str("<a id=\"lecture_complete_button\" href=\"#\">Complete and continue</a>");
    }
    body.push_str("</div>");
    format!("<html><head><title>Lecture</title></head><body>{}</body></html>", body)
}

/// 播放器 frame 的文档，内嵌包含加密视频地址的 JSON
pub fn player_frame(media_url: &str) -> String {
    let data = json!({
        "props": { "pageProps": { "applicationData": {
            "mediaAssets": [ { "urlEncrypted": media_url } ]
        } } }
    });
    format!(
        "<html><body><div id=\"player\"></div><script id=\"__NEXT_DATA__\" type=\"application/json\">{}</script></body></html>",
        data
    )
}

pub fn test_context(
    browser: Arc<FakeBrowser>,
    fetcher: Arc<FakeMediaFetcher>,
    output_root: &Path,
    complete_lecture: bool,
) -> CourseJobContext {
    let strategy = AuthStrategy::Manual { target_url: ENROLLED_URL.to_string() };
    test_context_with_strategy(browser, fetcher, output_root, complete_lecture, strategy)
}

pub fn test_context_with_strategy(
    browser: Arc<FakeBrowser>,
    fetcher: Arc<FakeMediaFetcher>,
    output_root: &Path,
    complete_lecture: bool,
    strategy: AuthStrategy,
) -> CourseJobContext {
    let config = Arc::new(AppConfig {
        output_root: output_root.to_path_buf(),
        complete_lecture,
        ..AppConfig::default()
    });
    let http_client = Arc::new(RobustClient::new(config.clone()).unwrap());
    CourseJobContext::new(config, http_client, browser, fetcher, strategy)
}
