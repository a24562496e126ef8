//! ShareVault CLI
//!
//! 命令行客户端，直接调用后端的上传/下载接口

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sharevault", version, about = "密码保护的文件中转客户端")]
struct Cli {
    /// 后端地址 (覆盖配置文件和 SHAREVAULT_API_BASE)
    #[arg(long, global = true)]
    api: Option<String>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 上传文件
    Upload {
        /// 要上传的文件路径
        file: PathBuf,
        /// 访问密码 (可为空)
        #[arg(short, long, default_value = "")]
        password: String,
    },
    /// 下载文件
    Download {
        /// 上传时得到的文件 ID
        file_id: String,
        /// 访问密码
        #[arg(short, long)]
        password: String,
        /// 保存目录 (默认: 配置中的下载目录)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 查看或修改配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 显示当前配置
    Show,
    /// 设置后端地址
    SetApi { url: String },
    /// 设置下载目录
    SetDownloadDir { dir: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = sharevault_core::ClientSettings::load();
    init_logging(cli.verbose || settings.verbose);

    if let Some(api) = &cli.api {
        settings.api_base = api.clone();
    }

    match cli.command {
        Commands::Upload { file, password } => {
            commands::upload(&settings, &file, password).await?;
        }
        Commands::Download {
            file_id,
            password,
            output,
        } => {
            if let Some(dir) = output {
                settings.download_dir = dir;
            }
            commands::download(&settings, file_id, password).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::show_config(&settings),
            ConfigAction::SetApi { url } => commands::set_api(url)?,
            ConfigAction::SetDownloadDir { dir } => commands::set_download_dir(dir)?,
        },
    }

    Ok(())
}

/// 初始化日志系统
///
/// 默认只输出警告，`-v` 或 RUST_LOG 打开更详细的日志
fn init_logging(verbose: bool) {
    // 桥接 log crate（sharevault-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,sharevault_core=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from(["sharevault", "upload", "a.txt", "-p", "secret"]).unwrap();
        match cli.command {
            Commands::Upload { file, password } => {
                assert_eq!(file, PathBuf::from("a.txt"));
                assert_eq!(password, "secret");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_upload_password_defaults_to_empty() {
        let cli = Cli::try_parse_from(["sharevault", "upload", "a.txt"]).unwrap();
        assert!(matches!(cli.command, Commands::Upload { ref password, .. } if password.is_empty()));
    }

    #[test]
    fn test_download_requires_password() {
        assert!(Cli::try_parse_from(["sharevault", "download", "abc123"]).is_err());

        let cli = Cli::try_parse_from([
            "sharevault",
            "--api",
            "http://backend:9000",
            "download",
            "abc123",
            "--password",
            "pw",
            "-o",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(cli.api.as_deref(), Some("http://backend:9000"));
        match cli.command {
            Commands::Download {
                file_id, output, ..
            } => {
                assert_eq!(file_id, "abc123");
                assert_eq!(output, Some(PathBuf::from("/tmp/out")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(["sharevault", "config", "set-api", "http://x"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::SetApi { ref url }
            } if url == "http://x"
        ));
    }
}
