//! 页面控制器
//!
//! 持有文档、会话与配置，对外提供整页翻译、划词翻译与还原三个操作，
//! 以及按消息协议分发请求的入口。

use std::path::Path;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::backend::{AiBackend, AiService, TranslationBackend};
use crate::chunker::create_chunks;
use crate::collector::collect_text_nodes;
use crate::config::TranslatorConfig;
use crate::error::{Result, TranslationError};
use crate::html_processor::Document;
use crate::placement::{place_chunk, PlacementMode};
use crate::protocol::{Request, Response};
use crate::session::{RestoreReport, Session};
use crate::stats::PipelineStats;
use crate::translation_error;
use crate::translator::dispatch_all;

/// 单个页面的控制器
pub struct PageController {
    document: Document,
    session: Session,
    config: TranslatorConfig,
}

impl PageController {
    pub fn new(document: Document, config: TranslatorConfig) -> Self {
        Self {
            document,
            session: Session::new(),
            config,
        }
    }

    /// 从HTML文件加载页面
    pub async fn open(path: &Path, config: TranslatorConfig) -> Result<Self> {
        let html_content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;
        Ok(Self::new(Document::parse(&html_content)?, config))
    }

    /// 把当前文档写到文件
    pub async fn save(&self, path: &Path) -> Result<()> {
        let html = self.document.serialize()?;
        tokio::fs::write(path, html)
            .await
            .map_err(|e| translation_error!(file_op, path.display(), "写入", e))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 翻译整页
    ///
    /// 顺序：下方显示模式先清理上一轮的下方译文；收集文本节点；保存原文快照；分块；派发并写回。
    /// 某个窗口失败时返回错误，此前窗口的写回保留。
    pub async fn translate<B: TranslationBackend>(
        &mut self,
        backend: &B,
        target_language: &str,
        mode: PlacementMode,
    ) -> Result<PipelineStats> {
        let started = Instant::now();
        let mut stats = PipelineStats::default();

        if mode == PlacementMode::Overlay {
            stats.overlays_removed = self.session.clear_overlays(&mut self.document);
        }

        let nodes = collect_text_nodes(&mut self.document);
        if nodes.is_empty() {
            return Err(TranslationError::NoContent);
        }
        stats.nodes_collected = nodes.len();

        let snapshot = self.session.capture(&self.document, &nodes, mode).to_vec();
        let chunks = create_chunks(&snapshot, self.config.max_chunk_chars());
        stats.chunks_created = chunks.len();

        info!(
            "📝 {} 个文本节点分成 {} 个分块，写回模式: {:?}",
            nodes.len(),
            chunks.len(),
            mode
        );

        let document = &mut self.document;
        let session = &mut self.session;
        let report = dispatch_all(
            &chunks,
            backend,
            target_language,
            self.config.concurrency(),
            |chunk, lines| place_chunk(document, session, chunk, lines, mode),
        )
        .await?;

        stats.windows_completed = report.windows_completed;
        stats.nodes_translated = report.placement.replaced;
        stats.overlays_created = report.placement.overlays_created;
        stats.nodes_untranslated = report.placement.untranslated;
        stats.translation_time = started.elapsed();

        info!(
            "✅ 翻译完成: {} 个分块，{} 个节点未翻译",
            report.chunks_translated, stats.nodes_untranslated
        );
        Ok(stats)
    }

    /// 翻译整页并把结果写到文件
    ///
    /// 只要开始派发，无论成败都会写出文件：某个窗口失败时，此前窗口已写回的译文
    /// 同样保存下来，随后再返回翻译错误。没有可翻译文本时不写文件。
    pub async fn translate_to_file<B: TranslationBackend>(
        &mut self,
        backend: &B,
        target_language: &str,
        mode: PlacementMode,
        output: &Path,
    ) -> Result<PipelineStats> {
        let result = self.translate(backend, target_language, mode).await;
        if matches!(result, Err(TranslationError::NoContent)) {
            return result;
        }

        if let Err(e) = &result {
            warn!("⚠️  翻译未全部完成，保存已完成部分: {}", e);
        }
        self.save(output).await?;
        info!("📄 已写出页面: {}", output.display());
        result
    }

    /// 翻译一段选中文本，不经过分块流水线
    pub async fn translate_selection<B: TranslationBackend>(
        &self,
        text: &str,
        backend: &B,
        target_language: &str,
    ) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslationError::NoContent);
        }
        backend.translate(text, target_language).await
    }

    /// 还原最近一次翻译前的原文
    pub fn restore(&mut self) -> Result<RestoreReport> {
        self.session
            .restore(&mut self.document, self.config.restore_policy())
    }

    /// 解析服务标识与密钥，得到本次请求使用的后端
    pub fn resolve_backend(&self, ai_service: &str, api_key: &str) -> Result<AiBackend> {
        let service: AiService = ai_service.parse()?;
        AiBackend::new(service, api_key, &self.config)
    }

    /// 按消息协议处理一个请求
    pub async fn handle(&mut self, request: Request) -> Response {
        let result = match request {
            Request::Translate {
                ai_service,
                api_key,
                target_language,
                show_below_mode,
            } => match self.resolve_backend(&ai_service, &api_key) {
                Ok(backend) => self
                    .translate(
                        &backend,
                        &target_language,
                        PlacementMode::from_show_below(show_below_mode),
                    )
                    .await
                    .map(|_| Response::ok()),
                Err(e) => Err(e),
            },
            Request::TranslateSelection {
                text,
                ai_service,
                api_key,
                target_language,
            } => match self.resolve_backend(&ai_service, &api_key) {
                Ok(backend) => self
                    .translate_selection(&text, &backend, &target_language)
                    .await
                    .map(Response::translated),
                Err(e) => Err(e),
            },
            Request::Restore => self.restore().map(|_| Response::ok()),
        };

        result.unwrap_or_else(|e| {
            error!("❌ 请求处理失败: {}", e);
            Response::from(&e)
        })
    }
}
