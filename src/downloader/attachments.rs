// src/downloader/attachments.rs

use crate::{
    client::RobustClient,
    constants::selectors::lecture,
    error::*,
    extractor::common::{selector, text_of},
    models::ArtifactStatus,
    utils,
};
use itertools::Itertools;
use log::{debug, error, warn};
use scraper::Html;
use std::{collections::HashSet, path::Path};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLink {
    pub url: Url,
    pub file_name: String,
}

/// 解析课时页面中的附件区域。页面没有附件区域时返回 `None`。
pub fn parse_attachment_links(source: &str, page_url: &Url) -> AppResult<Option<Vec<AttachmentLink>>> {
    let doc = Html::parse_document(source);
    let container_sel = selector(lecture::ATTACHMENTS)?;
    let link_sel = selector(lecture::ATTACHMENT_LINK)?;

    let containers: Vec<_> = doc.select(&container_sel).collect();
    if containers.is_empty() {
        return Ok(None);
    }

    let links = containers
        .into_iter()
        .flat_map(|c| c.select(&link_sel))
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            let url = page_url.join(href).ok()?;
            let name = attachment_name(a.value().attr("download"), &text_of(a), &url);
            Some((url, name))
        })
        .unique_by(|(url, _)| url.to_string())
        .enumerate()
        .map(|(i, (url, name))| AttachmentLink {
            file_name: name.unwrap_or_else(|| format!("attachment-{}", i + 1)),
            url,
        })
        .collect::<Vec<_>>();
    Ok(Some(dedupe_file_names(links)))
}

/// 文件名优先取 download 属性，其次是像文件名的链接文字，再次是地址的最后一段
fn attachment_name(download: Option<&str>, text: &str, url: &Url) -> Option<String> {
    let looks_like_file = |s: &str| s.rsplit_once('.').is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());
    download
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| looks_like_file(text).then(|| text.to_string()))
        .or_else(|| utils::file_name_from_url(url))
        .or_else(|| (!text.is_empty()).then(|| text.to_string()))
        .map(|s| utils::sanitize_file_name(&s))
}

/// 不同地址的附件可能同名，同名者追加序号
fn dedupe_file_names(links: Vec<AttachmentLink>) -> Vec<AttachmentLink> {
    let mut used = HashSet::new();
    links
        .into_iter()
        .map(|mut link| {
            if !used.insert(link.file_name.to_lowercase()) {
                let (stem, ext) = match link.file_name.rsplit_once('.') {
                    Some((s, e)) => (s.to_string(), format!(".{}", e)),
                    None => (link.file_name.clone(), String::new()),
                };
                let mut n = 2;
                while !used.insert(format!("{}-{}{}", stem, n, ext).to_lowercase()) {
                    n += 1;
                }
                link.file_name = format!("{}-{}{}", stem, n, ext);
            }
            link
        })
        .collect()
}

/// 逐个下载附件。单个附件失败不影响其余附件。
pub async fn download_attachments(client: &RobustClient, links: &[AttachmentLink], dir: &Path) -> ArtifactStatus {
    if links.is_empty() {
        debug!("附件区域中没有链接");
        return ArtifactStatus::Saved(Vec::new());
    }
    if let Err(e) = std::fs::create_dir_all(dir) {
        error!("创建附件目录 '{}' 失败: {}", dir.display(), e);
        return ArtifactStatus::Failed(e.to_string());
    }

    let mut saved = Vec::new();
    let mut errors = Vec::new();
    for link in links {
        let dest = dir.join(&link.file_name);
        match client.download_to_file(link.url.clone(), &dest).await {
            Ok(_) => saved.push(dest),
            Err(e) => {
                warn!("附件 '{}' 下载失败: {}", link.file_name, e);
                errors.push(format!("{}: {}", link.file_name, e));
            }
        }
    }

    if errors.is_empty() {
        ArtifactStatus::Saved(saved)
    } else {
        ArtifactStatus::Failed(format!("{}/{} 个附件下载失败 ({})", errors.len(), links.len(), errors.join("; ")))
    }
}
