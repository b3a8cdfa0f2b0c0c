// src/cli.rs

use crate::constants;
use clap::{ArgAction, Parser, crate_version};
use std::path::PathBuf;

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["url", "file"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 指定要下载的单个课程链接
    #[arg(long, help_heading = "Mode")]
    pub url: Option<String>,
    /// 从文本文件批量下载多个课程 (每行一个链接)
    #[arg(long, value_name = "FILE", help_heading = "Mode")]
    pub file: Option<PathBuf>,

    // --- 登录选项 (Auth) ---
    /// 登录邮箱
    #[arg(long, help_heading = "Auth")]
    pub email: Option<String>,
    /// 登录密码 (仅提供邮箱时将提示输入)
    #[arg(long, help_heading = "Auth")]
    pub password: Option<String>,
    /// 登录页面地址 (不提供时自动在课程页中查找登录链接)
    #[arg(long = "login_url", value_name = "URL", help_heading = "Auth")]
    pub login_url: Option<String>,
    /// 手动登录: 在浏览器中自行登录，程序等待浏览器到达此地址后继续
    #[arg(
        long = "man_login_url",
        value_name = "URL",
        conflicts_with_all = ["email", "password", "login_url"],
        help_heading = "Auth"
    )]
    pub man_login_url: Option<String>,

    // --- 下载选项 (Options) ---
    /// 处理完每个课时后将其标记为已完成
    #[arg(long = "complete-lecture", action = ArgAction::SetTrue, help_heading = "Options")]
    pub complete_lecture: bool,
    /// 设置文件保存目录
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_SAVE_DIR), help_heading = "Options")]
    pub output: PathBuf,
    /// 以无界面模式启动浏览器
    #[arg(long, action = ArgAction::SetTrue, help_heading = "Options")]
    pub headless: bool,
    /// WebDriver 服务地址 (覆盖配置文件)
    #[arg(long, value_name = "URL", help_heading = "Options")]
    pub webdriver_url: Option<String>,
    /// yt-dlp 可执行文件路径 (覆盖配置文件)
    #[arg(long, value_name = "PATH", help_heading = "Options")]
    pub ytdlp: Option<PathBuf>,

    // --- 通用选项 (General) ---
    /// 增加日志详细程度 (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true, help_heading = "General")]
    pub verbose: u8,
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
}

/// 本次运行采用的登录方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// 在课程页中查找登录链接后填写表单
    DiscoverLink { email: String, password: String },
    /// 直接打开给定的登录页后填写表单
    LoginUrl { login_url: String, email: String, password: String },
    /// 由用户在浏览器中手动登录
    Manual { target_url: String },
}

impl AuthStrategy {
    /// 根据命令行参数选择登录方式。手动登录与凭据参数互斥，由 clap 保证。
    /// `password` 为用户交互输入的密码 (仅在命令行未提供时使用)。
    pub fn from_args(args: &Cli, prompted_password: Option<String>) -> Option<Self> {
        if let Some(target_url) = &args.man_login_url {
            return Some(Self::Manual { target_url: target_url.clone() });
        }
        let email = args.email.clone()?;
        let password = args.password.clone().or(prompted_password)?;
        Some(match &args.login_url {
            Some(login_url) => Self::LoginUrl { login_url: login_url.clone(), email, password },
            None => Self::DiscoverLink { email, password },
        })
    }
}
