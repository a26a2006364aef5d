//! 分块翻译派发
//!
//! 把分块按并发上限切成顺序执行的窗口：窗口内的分块同时请求，整个窗口完成后
//! 才开始下一个窗口。每个分块的译文在该分块返回后立即写回。
//!
//! 任一分块失败时整个窗口失败，后续窗口不再发起；此前已完成窗口的写回保留。

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::api_constants::service_config::LINE_SEPARATOR;
use crate::backend::TranslationBackend;
use crate::chunker::Chunk;
use crate::error::Result;
use crate::placement::PlacementReport;

/// 派发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// 已完成的窗口数
    pub windows_completed: usize,
    /// 已写回的分块数
    pub chunks_translated: usize,
    /// 各分块写回结果的累计
    pub placement: PlacementReport,
}

/// 把后端返回的译文拆成行：按换行切分、去除首尾空白并丢弃空行
pub fn split_translated_lines(translated: &str) -> Vec<String> {
    translated
        .split(LINE_SEPARATOR)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 以窗口为单位并发翻译全部分块
///
/// `place` 在每个分块翻译成功后被调用，参数是该分块与拆分后的译文行。
pub async fn dispatch_all<B, F>(
    chunks: &[Chunk],
    backend: &B,
    target_language: &str,
    concurrency: usize,
    mut place: F,
) -> Result<DispatchReport>
where
    B: TranslationBackend,
    F: FnMut(&Chunk, &[String]) -> PlacementReport,
{
    let mut report = DispatchReport::default();
    let window_size = concurrency.max(1);
    let window_count = chunks.len().div_ceil(window_size);

    info!(
        "🚀 {} 个分块分成 {} 个窗口，后端: {}",
        chunks.len(),
        window_count,
        backend.name()
    );

    for (window_index, window) in chunks.chunks(window_size).enumerate() {
        debug!("处理窗口 {}/{}: {} 个分块", window_index + 1, window_count, window.len());

        let mut pending: FuturesUnordered<_> = window
            .iter()
            .map(|chunk| async move {
                let translated = backend.translate(chunk.text(), target_language).await;
                (chunk, translated)
            })
            .collect();

        while let Some((chunk, translated)) = pending.next().await {
            let translated = match translated {
                Ok(text) => text,
                Err(e) => {
                    warn!("❌ 窗口 {} 失败: {}", window_index + 1, e);
                    return Err(e);
                }
            };

            let lines = split_translated_lines(&translated);
            report.placement.merge(place(chunk, &lines));
            report.chunks_translated += 1;
        }

        report.windows_completed += 1;
        debug!("✅ 窗口 {} 完成", window_index + 1);
    }

    Ok(report)
}


#[cfg(test)]
mod tests {
    use super::test_support::MockBackend;
    use super::*;
    use crate::chunker::create_chunks;
    use crate::error::TranslationError;
    use crate::html_processor::{Document, TextNodeId};
    use std::sync::atomic::Ordering;

    fn chunks_of(texts: &[&str], max: usize) -> Vec<Chunk> {
        let body: String = texts.iter().map(|t| format!("<p>{}</p>", t)).collect();
        let mut doc = Document::parse(&format!("<html><body>{}</body></html>", body)).unwrap();
        let nodes: Vec<(TextNodeId, String)> = crate::collector::collect_text_nodes(&mut doc)
            .into_iter()
            .map(|id| (id, doc.text(id).unwrap()))
            .collect();
        create_chunks(&nodes, max)
    }

    #[test]
    fn test_split_translated_lines() {
        assert_eq!(
            split_translated_lines("  Un \n\n Deux\r\n\nTrois  \n"),
            vec!["Un", "Deux", "Trois"]
        );
        assert!(split_translated_lines("\n \n").is_empty());
    }

    #[tokio::test]
    async fn test_all_chunks_translated_and_placed() {
        // 每个分块只装一段
        let chunks = chunks_of(&["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff", "gggg"], 4);
        assert_eq!(chunks.len(), 7);
        let backend = MockBackend::with_prefix("T:");

        let mut placed: Vec<(String, Vec<String>)> = Vec::new();
        let report = dispatch_all(&chunks, &backend, "French", 3, |chunk, lines| {
            placed.push((chunk.text().to_string(), lines.to_vec()));
            PlacementReport {
                replaced: lines.len(),
                ..Default::default()
            }
        })
        .await
        .unwrap();

        assert_eq!(report.windows_completed, 3);
        assert_eq!(report.chunks_translated, 7);
        assert_eq!(report.placement.replaced, 7);
        assert_eq!(placed.len(), 7);
        assert!(placed.iter().all(|(text, lines)| lines == &vec![format!("T:{}", text)]));
        assert!(backend.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_window_concurrency_is_bounded() {
        let chunks = chunks_of(&["a", "b", "c", "d", "e"], 1);
        let mut backend = MockBackend::with_prefix("x");
        for text in ["a", "b", "c", "d", "e"] {
            backend
                .delays
                .insert(text.to_string(), std::time::Duration::from_millis(20));
        }

        dispatch_all(&chunks, &backend, "French", 2, |_, _| PlacementReport::default())
            .await
            .unwrap();
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(backend.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_failure_stops_later_windows_and_keeps_earlier() {
        let chunks = chunks_of(&["a", "b", "c", "d", "e", "f"], 1);
        let backend = MockBackend {
            prefix: "T:".to_string(),
            fail_on: Some("d".to_string()),
            ..Default::default()
        };

        let mut placed = Vec::new();
        let result = dispatch_all(&chunks, &backend, "French", 2, |chunk, _| {
            placed.push(chunk.text().to_string());
            PlacementReport::default()
        })
        .await;

        match result {
            Err(TranslationError::Backend { status, .. }) => assert_eq!(status, Some(500)),
            other => panic!("unexpected result: {other:?}"),
        }
        // 窗口1(a,b)完成；窗口2(c,d)失败；窗口3(e,f)从未发起
        assert!(placed.contains(&"a".to_string()));
        assert!(placed.contains(&"b".to_string()));
        assert!(!placed.contains(&"d".to_string()));
        let calls = backend.calls();
        assert!(!calls.contains(&"e".to_string()));
        assert!(!calls.contains(&"f".to_string()));
    }

    #[tokio::test]
    async fn test_placement_order_follows_completion_within_window() {
        let chunks = chunks_of(&["slow", "fast"], 1);
        let mut backend = MockBackend::with_prefix("");
        backend
            .delays
            .insert("slow".to_string(), std::time::Duration::from_millis(50));

        let mut placed = Vec::new();
        dispatch_all(&chunks, &backend, "French", 5, |chunk, _| {
            placed.push(chunk.text().to_string());
            PlacementReport::default()
        })
        .await
        .unwrap();

        assert_eq!(placed, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_empty_chunk_list() {
        let backend = MockBackend::default();
        let report = dispatch_all(&[], &backend, "French", 5, |_, _| PlacementReport::default())
            .await
            .unwrap();
        assert_eq!(report, DispatchReport::default());
        assert!(backend.calls().is_empty());
    }
}
