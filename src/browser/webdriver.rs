// src/browser/webdriver.rs

use super::BrowserSession;
use crate::{config::AppConfig, constants::timeouts, error::*};
use async_trait::async_trait;
use log::{debug, info, trace};
use serde_json::Value;
use std::time::Duration;
use thirtyfour::{ChromiumLikeCapabilities, prelude::*};

/// 基于 WebDriver (chromedriver) 的浏览器会话
pub struct WebDriverSession {
    driver: WebDriver,
}

impl WebDriverSession {
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        if let Some((width, height)) = config.window_size {
            caps.add_arg(&format!("--window-size={},{}", width, height))?;
        }
        caps.add_arg("--disable-blink-features=AutomationControlled")?;

        info!("连接 WebDriver: {}", config.webdriver_url);
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps).await?;
        driver.set_page_load_timeout(timeouts::PAGE_LOAD).await?;
        Ok(Self { driver })
    }

    /// 按选择器等待元素出现，在 `timeout` 内每隔 `POLL_INTERVAL` 重试一次
    async fn wait_all(&self, selector: &str, timeout: Duration) -> AppResult<Vec<WebElement>> {
        let elements = self
            .driver
            .query(By::Css(selector))
            .wait(timeout, timeouts::POLL_INTERVAL.min(timeout))
            .all_from_selector()
            .await?;
        if elements.is_empty() {
            return Err(element_timeout(selector, timeout));
        }
        Ok(elements)
    }
}

fn element_timeout(selector: &str, timeout: Duration) -> AppError {
    AppError::ElementTimeout {
        selector: selector.to_string(),
        timeout,
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("打开页面: {}", url);
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn page_source(&self) -> AppResult<String> {
        Ok(self.driver.source().await?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> AppResult<()> {
        let found = self
            .driver
            .query(By::Css(selector))
            .wait(timeout, timeouts::POLL_INTERVAL.min(timeout))
            .exists()
            .await?;
        if found { Ok(()) } else { Err(element_timeout(selector, timeout)) }
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> AppResult<Value> {
        trace!("执行脚本: {}", script);
        let ret = self.driver.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    async fn click(&self, selector: &str, timeout: Duration) -> AppResult<()> {
        let element = self
            .driver
            .query(By::Css(selector))
            .wait(timeout, timeouts::POLL_INTERVAL.min(timeout))
            .first_opt()
            .await?
            .ok_or_else(|| element_timeout(selector, timeout))?;
        element.click().await?;
        Ok(())
    }

    async fn frame_count(&self, selector: &str) -> AppResult<usize> {
        Ok(self.driver.find_all(By::Css(selector)).await?.len())
    }

    async fn enter_frame(&self, selector: &str, index: usize, timeout: Duration) -> AppResult<()> {
        let frame = self
            .wait_all(selector, timeout)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| element_timeout(selector, timeout))?;
        frame.enter_frame().await?;
        Ok(())
    }

    async fn leave_frame(&self) -> AppResult<()> {
        self.driver.enter_default_frame().await?;
        Ok(())
    }

    async fn cookies(&self) -> AppResult<Vec<(String, String)>> {
        let cookies = self.driver.get_all_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect())
    }

    async fn shutdown(&self) -> AppResult<()> {
        info!("关闭浏览器会话");
        self.driver.clone().quit().await?;
        Ok(())
    }
}
