use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use rust_liquidluck::core::scaffold::init_site;
use rust_liquidluck::core::{BuildReport, Engine};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// 配置文件（相对于站点目录）
    #[arg(short = 'f', long = "config", default_value = "settings.yml")]
    pub config: PathBuf,

    /// 只输出警告和错误日志
    #[arg(long, global = true)]
    pub disable_log: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 生成静态文件（默认命令）
    Build,

    /// 清理生成的文件
    Clean,

    /// 初始化新的站点
    Init(InitArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// 站点目录名称
    #[arg(value_name = "NAME")]
    pub name: String,

    /// 站点标题
    #[arg(short, long)]
    pub title: Option<String>,
}

fn print_summary(report: &BuildReport) {
    println!(
        "{} {} 篇文章（{} 篇非公开），{} 个页面，{} 个文件",
        "读取".bright_cyan(),
        report.public_posts + report.secure_posts,
        report.secure_posts,
        report.pure_pages,
        report.pure_files,
    );
    for (writer, count) in &report.dispatch.writers {
        println!("  {:<14} {}", writer.bright_white(), count);
    }
    println!("{} 共生成 {} 个文件", "完成".bright_green(), report.dispatch.total());
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let site_path = cli.path.clone();

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let engine = Engine::load(site_path, &cli.config)?;
            // 构建是同步的 CPU 密集任务
            let report = tokio::task::spawn_blocking(move || engine.build()).await??;
            print_summary(&report);
        }
        Commands::Clean => {
            let engine = Engine::load(site_path, &cli.config)?;
            engine.clean().await?;
        }
        Commands::Init(args) => {
            let site_path = site_path.join(&args.name);
            let title = args.title.unwrap_or_else(|| args.name.clone());
            init_site(&site_path, &title)?;
            info!("新站点位于: {}", site_path.display());
        }
    }

    Ok(())
}
