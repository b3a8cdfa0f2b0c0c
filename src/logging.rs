// src/logging.rs

use crate::constants;
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, warn};
use std::env;

/// 将 `-v` 的次数映射为终端日志级别
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// 初始化日志: 终端按 `-v` 级别输出，日志文件始终记录 debug 及以上级别。
pub fn init(verbose: u8) {
    let console_level = level_for_verbosity(verbose);
    let app_name = clap::crate_name!();

    // 优先使用标准配置目录
    let log_file_path = match crate::config::file::config_dir() {
        Ok(dir) => dir.join(constants::LOG_FILE_NAME),
        // 如果无法获取主目录，则回退到临时目录
        Err(_) => env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME),
    };

    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
    }

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .level(console_level)
        .format(move |out, message, record| {
            out.finish(format_args!("[{}] {}", colors.color(record.level()), message))
        })
        .chain(std::io::stderr());

    let file_level = console_level.max(LevelFilter::Debug);
    let mut root = fern::Dispatch::new()
        .level(file_level)
        // 第三方库的日志过于冗长
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Info)
        .level_for("html5ever", LevelFilter::Warn)
        .level_for("selectors", LevelFilter::Warn)
        .chain(console);

    let mut file_fallback = false;
    match fern::log_file(&log_file_path) {
        Ok(file) => {
            root = root.chain(
                fern::Dispatch::new()
                    .level(file_level)
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "[{}] [{:<5}] [{}:{}] - {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            record.line().unwrap_or(0),
                            message
                        ))
                    })
                    .chain(file),
            );
        }
        Err(_) => file_fallback = true,
    }

    if let Err(e) = root.apply() {
        eprintln!("警告: 日志系统初始化失败: {}", e);
        return;
    }
    if file_fallback {
        warn!("无法打开日志文件 {:?}，日志仅输出到终端。", log_file_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping_increases() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(3), LevelFilter::Trace);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }
}
