// src/client.rs

use crate::{config::AppConfig, error::*};
use futures::StreamExt;
use log::debug;
use reqwest::{IntoUrl, Response, cookie::Jar};
use std::{io::Write, path::Path, sync::Arc};
use url::Url;

/// 全程共用的 HTTP 客户端。登录后会同步浏览器的 Cookie，
/// 使附件、字幕与封面的下载与浏览器拥有同样的会话。
#[derive(Clone)]
pub struct RobustClient {
    pub client: reqwest::Client,
    jar: Arc<Jar>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self { client, jar })
    }

    /// 将浏览器 Cookie 写入客户端的 Cookie 容器
    pub fn import_cookies(&self, origin: &Url, cookies: &[(String, String)]) {
        for (name, value) in cookies {
            self.jar.add_cookie_str(&format!("{}={}", name, value), origin);
        }
        debug!("已为 {} 导入 {} 个浏览器 Cookie", origin, cookies.len());
    }

    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.client.get(url).send().await?;
        Ok(res.error_for_status()?)
    }

    /// 流式下载到目标目录中的临时文件，完成后原子地重命名为目标文件。
    pub async fn download_to_file<T: IntoUrl>(&self, url: T, dest: &Path) -> AppResult<u64> {
        let res = self.get(url).await?;
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        let mut written = 0u64;
        let mut stream = res.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            temp.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        temp.persist(dest)?;
        debug!("已保存 {} ({} 字节)", dest.display(), written);
        Ok(written)
    }
}
