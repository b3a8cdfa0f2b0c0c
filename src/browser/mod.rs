// src/browser/mod.rs

mod webdriver;

pub use webdriver::WebDriverSession;

use crate::error::*;
use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use std::{future::Future, time::Duration};

/// 浏览器会话的能力接口。核心流程只依赖此接口，便于使用假实现测试。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> AppResult<()>;

    async fn current_url(&self) -> AppResult<String>;

    /// 当前文档 (或当前 frame) 序列化后的 DOM
    async fn page_source(&self) -> AppResult<String>;

    /// 等待元素出现，超时返回 `AppError::ElementTimeout`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> AppResult<()>;

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> AppResult<Value>;

    /// 等待元素出现后点击
    async fn click(&self, selector: &str, timeout: Duration) -> AppResult<()>;

    async fn frame_count(&self, selector: &str) -> AppResult<usize>;

    /// 将焦点切换到第 `index` 个 (从 0 开始) 匹配的 frame
    async fn enter_frame(&self, selector: &str, index: usize, timeout: Duration) -> AppResult<()>;

    /// 将焦点恢复到顶层文档
    async fn leave_frame(&self) -> AppResult<()>;

    async fn cookies(&self) -> AppResult<Vec<(String, String)>>;

    async fn shutdown(&self) -> AppResult<()>;
}

/// 在指定 frame 内执行 `body`，无论结果如何都会把焦点恢复到顶层文档。
pub async fn within_frame<F, Fut, T>(
    session: &dyn BrowserSession,
    selector: &str,
    index: usize,
    timeout: Duration,
    body: F,
) -> AppResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let result = match session.enter_frame(selector, index, timeout).await {
        Ok(()) => body().await,
        Err(e) => Err(e),
    };
    if let Err(e) = session.leave_frame().await {
        warn!("恢复顶层文档焦点失败: {}", e);
    }
    result
}

/// 等待元素出现，超时返回 `Ok(false)` 而不是错误
pub async fn is_present(session: &dyn BrowserSession, selector: &str, timeout: Duration) -> AppResult<bool> {
    match session.wait_for(selector, timeout).await {
        Ok(()) => Ok(true),
        Err(AppError::ElementTimeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
