// src/downloader/mod.rs

pub mod attachments;
mod job;
pub mod lecture;
pub mod subtitles;

pub use job::CourseDownloader;
pub use lecture::LectureProcessor;

use crate::{
    models::{ArtifactStatus, LectureOutcome},
    symbols, ui,
};
use colored::*;
use log::info;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactStats {
    pub saved: usize,
    pub skipped: usize,
    pub absent: usize,
    pub failed: usize,
}

/// 一门课程的处理汇总
#[derive(Debug, Clone, Default)]
pub struct CourseReport {
    pub course_title: String,
    pub lectures: usize,
    pub stats: ArtifactStats,
    /// (产物类型, 课时名, 原因)
    failures: Vec<(&'static str, String, String)>,
}

impl CourseReport {
    pub fn new(course_title: &str) -> Self {
        Self { course_title: course_title.to_string(), ..Default::default() }
    }

    pub fn record(&mut self, outcome: &LectureOutcome) {
        self.lectures += 1;
        for artifact in &outcome.artifacts {
            match &artifact.status {
                ArtifactStatus::Saved(_) => self.stats.saved += 1,
                ArtifactStatus::Skipped(_) => self.stats.skipped += 1,
                ArtifactStatus::Absent => self.stats.absent += 1,
                ArtifactStatus::Failed(reason) => {
                    self.stats.failed += 1;
                    let lecture = match artifact.frame {
                        Some(n) => format!("{} (播放器 {})", outcome.stem, n),
                        None => outcome.stem.clone(),
                    };
                    self.failures.push((artifact.kind.label(), lecture, reason.clone()));
                }
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }

    pub fn print(&self) {
        let s = &self.stats;
        info!(
            "课程报告 '{}': Lectures={}, Saved={}, Skipped={}, Absent={}, Failed={}",
            self.course_title, self.lectures, s.saved, s.skipped, s.absent, s.failed
        );

        if !self.failures.is_empty() {
            ui::print_sub_header("失败详情");
            print_grouped_failures(&self.failures);
        }
        ui::print_sub_header(&format!("课程总结: {}", self.course_title));
        if !self.has_failures() {
            println!("{} 全部 {} 个课时处理完成。", *symbols::OK, self.lectures);
        }
        println!(
            "{} | {} | {} | {}",
            format!("已保存: {}", s.saved).green(),
            format!("失败: {}", s.failed).red(),
            format!("跳过: {}", s.skipped).yellow(),
            format!("不存在: {}", s.absent).bright_black()
        );
    }
}

// 按产物类型分组打印
fn print_grouped_failures(items: &[(&'static str, String, String)]) {
    let mut grouped: BTreeMap<&str, Vec<(&String, &String)>> = BTreeMap::new();
    for (kind, lecture, reason) in items {
        grouped.entry(*kind).or_default().push((lecture, reason));
    }
    for (kind, mut entries) in grouped {
        println!("\n{} {} ({}个):", *symbols::ERROR, kind, entries.len());
        entries.sort();
        for (lecture, reason) in entries {
            println!("  - {}", lecture);
            println!("    {}", format!("原因: {}", reason).red());
        }
    }
}
