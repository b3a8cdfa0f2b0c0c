// src/error.rs

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("临时文件持久化失败: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("浏览器操作失败: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),
    #[error("等待元素 '{selector}' 超时 ({timeout:?})")]
    ElementTimeout { selector: String, timeout: Duration },
    #[error("无效的 CSS 选择器 '{0}'")]
    Selector(String),
    #[error("无法识别的课程页面模板: {0}")]
    UnsupportedTemplate(String),
    #[error("未找到课程标题元素")]
    CourseTitleNotFound,
    #[error("登录失败: {0}")]
    LoginFailed(String),
    #[error("未找到视频描述信息: {0}")]
    MediaDescriptorMissing(String),
    #[error("媒体下载器执行失败 (状态: {status}): {stderr}")]
    MediaFetcher { status: String, stderr: String },
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
