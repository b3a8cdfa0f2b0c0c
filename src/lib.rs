// src/lib.rs

pub mod auth;
pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod media;
pub mod models;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    auth::Authenticator,
    browser::{BrowserSession, WebDriverSession},
    cli::{AuthStrategy, Cli},
    client::RobustClient,
    config::AppConfig,
    downloader::CourseDownloader,
    error::{AppError, AppResult},
    media::{MediaFetcher, YtDlpFetcher},
};
use colored::*;
use log::{debug, error, info, warn};
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex as TokioMutex;

/// 核心的执行上下文，包含所有课程共用的会话与工具。整个运行期间只有一个浏览器会话。
#[derive(Clone)]
pub struct CourseJobContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub session: Arc<dyn BrowserSession>,
    pub fetcher: Arc<dyn MediaFetcher>,
    pub auth: Arc<TokioMutex<Authenticator>>,
}

impl CourseJobContext {
    pub fn new(
        config: Arc<AppConfig>,
        http_client: Arc<RobustClient>,
        session: Arc<dyn BrowserSession>,
        fetcher: Arc<dyn MediaFetcher>,
        strategy: AuthStrategy,
    ) -> Self {
        let auth = Arc::new(TokioMutex::new(Authenticator::new(strategy, &config)));
        Self { config, http_client, session, fetcher, auth }
    }
}

/// 批量任务的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let strategy = resolve_auth_strategy(&args)?;

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let http_client = Arc::new(RobustClient::new(config.clone())?);
    let fetcher: Arc<dyn MediaFetcher> = Arc::new(YtDlpFetcher::new(&config));
    let session: Arc<dyn BrowserSession> = Arc::new(WebDriverSession::connect(&config).await?);
    let context = CourseJobContext::new(config, http_client, session, fetcher, strategy);
    run_with_session(&args, context).await
}

/// 在已建立的浏览器会话上执行下载任务。无论成功、失败还是中断，返回前都会关闭浏览器会话。
pub async fn run_with_session(args: &Cli, context: CourseJobContext) -> AppResult<()> {
    let session = context.session.clone();
    let result = tokio::select! {
        r = run_mode(args, context) => r,
        _ = tokio::signal::ctrl_c() => {
            warn!("收到中断信号，正在关闭浏览器");
            println!("\n{} 用户中断，正在关闭浏览器...", *symbols::WARN);
            Err(AppError::UserInterrupt)
        }
    };

    if let Err(e) = session.shutdown().await {
        warn!("关闭浏览器会话失败: {}", e);
    }
    result
}

/// 选择登录方式。仅提供邮箱时交互输入密码；没有可用的登录方式是致命错误。
fn resolve_auth_strategy(args: &Cli) -> AppResult<AuthStrategy> {
    let prompted = if args.man_login_url.is_none() && args.email.is_some() && args.password.is_none() {
        let password = ui::prompt_hidden("请输入登录密码")
            .map_err(|e| AppError::UserInputError(format!("读取密码失败: {}", e)))?;
        Some(password)
    } else {
        None
    };
    AuthStrategy::from_args(args, prompted).ok_or_else(|| {
        AppError::UserInputError("必须提供登录方式: --email 与 --password，或 --man_login_url".to_string())
    })
}

async fn run_mode(args: &Cli, context: CourseJobContext) -> AppResult<()> {
    if let Some(batch_file) = &args.file {
        process_batch_file(batch_file, context).await.map(drop)
    } else if let Some(url) = &args.url {
        CourseDownloader::new(context).run(url).await.map(drop)
    } else {
        Err(AppError::UserInputError("必须提供 --url 或 --file".to_string()))
    }
}

/// 读取批量文件中的课程链接，忽略空行与 `#` 开头的注释行
pub fn read_course_list(batch_file: &Path) -> AppResult<Vec<String>> {
    let content = std::fs::read_to_string(batch_file).map_err(|e| {
        error!("读取批量文件 '{}' 失败: {}", batch_file.display(), e);
        AppError::from(e)
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// 依次处理批量文件中的课程。单门课程失败只放弃该课程，不影响其余课程。
pub async fn process_batch_file(batch_file: &Path, context: CourseJobContext) -> AppResult<BatchSummary> {
    let courses = read_course_list(batch_file)?;
    if courses.is_empty() {
        warn!("批量文件 '{}' 为空或不含有效行。", batch_file.display());
        ui::warn(&format!("批量文件 '{}' 为空。", batch_file.display()));
        return Ok(BatchSummary::default());
    }
    Ok(run_courses(&courses, context).await)
}

pub async fn run_courses(courses: &[String], context: CourseJobContext) -> BatchSummary {
    let mut summary = BatchSummary::default();
    ui::print_header(&format!("开始批量处理课程 (按 {} 可随时退出)", *symbols::CTRL_C));
    for (i, course) in courses.iter().enumerate() {
        ui::print_sub_header(&format!(
            "课程 {}/{} - {}",
            i + 1,
            courses.len(),
            utils::truncate_text(course, 60)
        ));
        match CourseDownloader::new(context.clone()).run(course).await {
            Ok(report) => {
                info!("课程 '{}' 处理完成", report.course_title);
                summary.succeeded += 1;
            }
            Err(e) => {
                summary.failed += 1;
                error!("课程 '{}' 处理失败: {}", course, e);
                ui::error(&format!("课程处理失败，已跳过: {}", e));
            }
        }
    }

    ui::print_header("批量任务报告");
    println!(
        "{} | {} | 总计: {}",
        format!("成功课程: {}", summary.succeeded).green(),
        format!("失败课程: {}", summary.failed).red(),
        courses.len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_course_list_skips_blank_and_comment_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://school.example.com/p/a\n\n   \n# 暂不下载\n  https://school.example.com/p/b  ").unwrap();
        let courses = read_course_list(file.path()).unwrap();
        assert_eq!(courses, vec!["https://school.example.com/p/a", "https://school.example.com/p/b"]);
    }
}
