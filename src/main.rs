use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use translation_cli::backend::{AiBackend, AiService, TranslationBackend};
use translation_cli::config::{Cli, Command, ServiceArgs, SessionArgs, TextArgs, TranslateArgs, TranslatorConfig};
use translation_cli::controller::PageController;
use translation_cli::error::TranslationError;
use translation_cli::placement::PlacementMode;
use translation_cli::protocol::{Request, Response};
use translation_cli::stats::{format_duration, print_performance_stats};
use translation_cli::utils::{
    generate_output_path, init_logging, parse_endpoint_override, resolve_api_key,
    validate_input_file,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let total_start = Instant::now();

    let result = match &cli.command {
        Command::Translate(args) => run_translate(args, cli.verbose).await,
        Command::Text(args) => run_text(args).await,
        Command::Session(args) => run_session(args).await,
    };

    match result {
        Ok(()) => {
            info!("✅ 完成！总耗时: {}", format_duration(total_start.elapsed()));
            Ok(())
        }
        Err(e) => {
            error!("❌ 执行失败: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// 按命令行参数构造后端
fn build_backend(args: &ServiceArgs, config: &TranslatorConfig) -> Result<AiBackend> {
    let service: AiService = args.service.parse()?;
    let config = args.apply(config.clone(), service);

    let api_key = resolve_api_key(service, args.api_key.clone());
    let backend = AiBackend::new(service, &api_key, &config)?;
    info!("🤖 翻译后端: {} ({})", backend.service(), backend.endpoint());
    Ok(backend)
}

async fn run_translate(args: &TranslateArgs, verbose: bool) -> Result<()> {
    validate_input_file(&args.input)?;
    let output_path = generate_output_path(&args.input, &args.output, &args.service.lang);
    let mode = PlacementMode::from_show_below(args.overlay);

    info!("🚀 启动网页翻译");
    info!("📂 输入文件: {}", args.input.display());
    info!("📄 输出文件: {}", output_path.display());
    info!("🌐 目标语言: {} ({:?})", args.service.lang, mode);

    let total_start = Instant::now();

    let config = args.pipeline.apply(TranslatorConfig::new());
    let backend = build_backend(&args.service, &config)?;

    let mut controller = PageController::open(&args.input, config).await?;
    let stats = controller
        .translate_to_file(&backend, &args.service.lang, mode, &output_path)
        .await?;

    if stats.nodes_untranslated > 0 {
        warn!("⚠️  {} 个文本节点没有对应的译文行", stats.nodes_untranslated);
    }

    if args.stats || verbose {
        print_performance_stats(&stats, total_start.elapsed());
    }

    Ok(())
}

async fn run_text(args: &TextArgs) -> Result<()> {
    let config = TranslatorConfig::new();
    let backend = build_backend(&args.service, &config)?;

    let text = args.text.trim();
    if text.is_empty() {
        return Err(TranslationError::NoContent.into());
    }
    let translated = backend.translate(text, &args.service.lang).await?;

    println!("{}", translated);
    Ok(())
}

/// 逐行读取JSON请求并在同一页面上处理，每个请求输出一行JSON响应
async fn run_session(args: &SessionArgs) -> Result<()> {
    validate_input_file(&args.input)?;
    let output_path = generate_output_path(&args.input, &args.output, "session");

    let mut config = args.pipeline.apply(TranslatorConfig::new());
    for value in &args.endpoints {
        let (service, url) = parse_endpoint_override(value)?;
        config = config.with_endpoint(service, &url);
    }

    let mut controller = PageController::open(&args.input, config).await?;

    info!("📡 会话已就绪: {}", args.input.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => controller.handle(request).await,
            Err(e) => {
                warn!("⚠️  无法解析请求: {}", e);
                Response::failure(format!("无法解析请求: {}", e))
            }
        };
        handled += 1;

        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        stdout.write_all(payload.as_bytes()).await?;
        stdout.flush().await?;
    }

    controller.save(&output_path).await?;
    info!("💾 会话结束，共处理 {} 个请求，页面已写出: {}", handled, output_path.display());
    Ok(())
}
