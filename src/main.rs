// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use course_dl::{cli::Cli, logging, run_from_cli};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "course-dl".to_string());

    let after_help = format!(
        "示例:\n  # 使用账号密码下载单个课程\n  {bin} --url \"https://school.example.com/p/course\" --email me@example.com\n\n  # 指定登录页并批量下载\n  {bin} --file courses.txt --email me@example.com --password secret --login_url \"https://sso.example.com/sign_in\"\n\n  # 在浏览器中手动登录\n  {bin} --url \"https://school.example.com/p/course\" --man_login_url \"https://school.example.com/courses/enrolled\"",
        bin = bin_name
    );

    let args = match parse_args(after_help) {
        Ok(args) => Arc::new(args),
        // 帮助与版本信息正常退出，参数错误统一以 1 退出
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    logging::init(args.verbose);

    if let Err(e) = run_from_cli(args).await {
        log::error!("程序执行出错: {}", e);
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}

fn parse_args(after_help: String) -> Result<Cli, clap::Error> {
    let matches = Cli::command().after_help(after_help).try_get_matches()?;
    Cli::from_arg_matches(&matches)
}
