// src/models/mod.rs

use crate::{constants, symbols, utils};
use colored::ColoredString;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// 课程页面模板。只支持固定的三种。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Simple,
    Classic,
    Colossal,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Simple => "simple",
            Template::Classic => "classic",
            Template::Colossal => "colossal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// 从 1 开始的章节序号
    pub index: usize,
    /// `NN-章节标题`
    pub title: String,
    pub output_dir: PathBuf,
}

impl Chapter {
    pub fn new(index: usize, raw_title: &str, course_dir: &Path) -> Self {
        let title = utils::numbered_name(index, raw_title);
        let output_dir = course_dir.join(&title);
        Self { index, title, output_dir }
    }
}

/// 课时清单中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureEntry {
    pub link: String,
    /// 已清理并截断的标题
    pub title: String,
    /// 章节内从 1 开始的序号
    pub sequence_index: usize,
    pub chapter_output_dir: PathBuf,
}

impl LectureEntry {
    pub fn new(link: String, raw_title: &str, sequence_index: usize, chapter_output_dir: &Path) -> Self {
        Self {
            link,
            title: utils::fit_title(sequence_index, raw_title),
            sequence_index,
            chapter_output_dir: chapter_output_dir.to_path_buf(),
        }
    }

    /// `NN-标题`，所有产物文件名的公共部分
    pub fn stem(&self) -> String {
        format!("{}{}", utils::index_prefix(self.sequence_index), self.title)
    }

    pub fn html_path(&self) -> PathBuf {
        self.chapter_output_dir.join(format!("{}.html", self.stem()))
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.chapter_output_dir.join(self.stem())
    }

    /// 视频与字幕文件的路径前缀 (不含扩展名)。页面有多个播放器时追加 `-N`。
    pub fn media_stem(&self, frame_number: usize, frame_total: usize) -> PathBuf {
        if frame_total > 1 {
            self.chapter_output_dir.join(format!("{}-{}", self.stem(), frame_number))
        } else {
            self.chapter_output_dir.join(self.stem())
        }
    }
}

/// 一门课程解析出的完整结构
#[derive(Debug, Clone)]
pub struct LectureManifest {
    pub template: Template,
    pub course_title: String,
    pub course_dir: PathBuf,
    pub chapters: Vec<Chapter>,
    pub entries: Vec<LectureEntry>,
}

impl LectureManifest {
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.course_dir)?;
        for chapter in &self.chapters {
            std::fs::create_dir_all(&chapter.output_dir)?;
        }
        Ok(())
    }
}

/// 页面内嵌 JSON 中的视频描述信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub url_encrypted: String,
}

impl MediaDescriptor {
    pub fn from_next_data(data: &Value) -> Option<Self> {
        data.pointer(constants::MEDIA_DESCRIPTOR_POINTER)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| Self { url_encrypted: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    Html,
    Attachments,
    Subtitles,
    Video,
    Completion,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Html => "页面快照",
            ArtifactKind::Attachments => "附件",
            ArtifactKind::Subtitles => "字幕",
            ArtifactKind::Video => "视频",
            ArtifactKind::Completion => "完成标记",
        }
    }
}

/// 单个产物的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Saved(Vec<PathBuf>),
    Skipped(String),
    /// 页面上不存在该产物 (例如没有附件区域)
    Absent,
    Failed(String),
}

impl ArtifactStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ArtifactStatus::Failed(_))
    }

    pub fn symbol(&self) -> &'static ColoredString {
        match self {
            ArtifactStatus::Saved(_) => &symbols::OK,
            ArtifactStatus::Skipped(_) => &symbols::INFO,
            ArtifactStatus::Absent => &symbols::SKIP,
            ArtifactStatus::Failed(_) => &symbols::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    /// 多播放器页面中的播放器编号
    pub frame: Option<usize>,
    pub status: ArtifactStatus,
}

/// 一个课时全部产物的处理记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureOutcome {
    pub stem: String,
    pub artifacts: Vec<ArtifactRecord>,
}

impl LectureOutcome {
    pub fn new(stem: String) -> Self {
        Self { stem, artifacts: Vec::new() }
    }

    pub fn record(&mut self, kind: ArtifactKind, frame: Option<usize>, status: ArtifactStatus) {
        self.artifacts.push(ArtifactRecord { kind, frame, status });
    }

    pub fn status_of(&self, kind: ArtifactKind) -> Vec<&ArtifactStatus> {
        self.artifacts
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| &a.status)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.artifacts.iter().filter(|a| a.status.is_failure())
    }
}
