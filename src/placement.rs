//! 译文写回
//!
//! 两种互斥模式：原位替换文本节点，或在所在元素之后插入下方译文元素。

use tracing::debug;

use crate::chunker::Chunk;
use crate::html_processor::Document;
use crate::session::Session;

/// 写回模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// 原位替换
    #[default]
    Replace,
    /// 在原文下方显示
    Overlay,
}

impl PlacementMode {
    /// 对应消息协议中的`showBelowMode`
    pub fn from_show_below(show_below: bool) -> Self {
        if show_below {
            PlacementMode::Overlay
        } else {
            PlacementMode::Replace
        }
    }
}

/// 单个分块的写回结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementReport {
    /// 被替换的文本节点数
    pub replaced: usize,
    /// 新建的下方译文元素数
    pub overlays_created: usize,
    /// 没有对应译文行而保持原样的节点数
    pub untranslated: usize,
}

impl PlacementReport {
    pub fn merge(&mut self, other: PlacementReport) {
        self.replaced += other.replaced;
        self.overlays_created += other.overlays_created;
        self.untranslated += other.untranslated;
    }
}

/// 把译文行按位置与分块中的节点配对写回
///
/// 第i行对应第i个节点；行数不足时，多出的节点保持原样。
pub fn place_chunk(
    document: &mut Document,
    session: &mut Session,
    chunk: &Chunk,
    lines: &[String],
    mode: PlacementMode,
) -> PlacementReport {
    let mut report = PlacementReport::default();

    for (index, entry) in chunk.entries().iter().enumerate() {
        let Some(line) = lines.get(index) else {
            report.untranslated += 1;
            continue;
        };

        match mode {
            PlacementMode::Replace => {
                if document.set_text(entry.node, line) {
                    report.replaced += 1;
                }
            }
            PlacementMode::Overlay => match document.insert_overlay_after(entry.node, line) {
                Some(overlay) => {
                    session.record_overlay(overlay);
                    report.overlays_created += 1;
                }
                None => report.untranslated += 1,
            },
        }
    }

    if report.untranslated > 0 {
        debug!(
            "⚠️  分块返回 {} 行译文，{} 个节点未翻译",
            lines.len(),
            report.untranslated
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_constants::overlay_config::OVERLAY_CLASS;
    use crate::chunker::create_chunks;
    use crate::collector::collect_text_nodes;
    use crate::html_processor::TextNodeId;

    fn setup(html: &str) -> (Document, Vec<TextNodeId>, Chunk) {
        let mut doc = Document::parse(html).unwrap();
        let nodes = collect_text_nodes(&mut doc);
        let pairs: Vec<_> = nodes.iter().map(|id| (*id, doc.text(*id).unwrap())).collect();
        let chunk = create_chunks(&pairs, 2000).remove(0);
        (doc, nodes, chunk)
    }

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_replace_all_lines() {
        let (mut doc, nodes, chunk) =
            setup("<html><body><p>One</p><p>Two</p><p>Three</p></body></html>");
        let mut session = Session::new();

        let report = place_chunk(&mut doc, &mut session, &chunk, &lines(&["Un", "Deux", "Trois"]), PlacementMode::Replace);
        assert_eq!(report.replaced, 3);
        assert_eq!(report.overlays_created, 0);
        assert_eq!(doc.text(nodes[2]).as_deref(), Some("Trois"));
        assert_eq!(doc.count_elements_with_class(OVERLAY_CLASS), 0);
    }

    #[test]
    fn test_replace_fewer_lines_leaves_tail_untouched() {
        let (mut doc, nodes, chunk) =
            setup("<html><body><p>One</p><p>Two</p><p>Three</p></body></html>");
        let mut session = Session::new();

        let report = place_chunk(&mut doc, &mut session, &chunk, &lines(&["Un"]), PlacementMode::Replace);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.untranslated, 2);
        assert_eq!(doc.text(nodes[0]).as_deref(), Some("Un"));
        assert_eq!(doc.text(nodes[1]).as_deref(), Some("Two"));
        assert_eq!(doc.text(nodes[2]).as_deref(), Some("Three"));
    }

    #[test]
    fn test_overlay_leaves_originals_untouched() {
        let (mut doc, nodes, chunk) =
            setup("<html><body><div><p>One</p><p>Two</p></div></body></html>");
        let mut session = Session::new();

        let report = place_chunk(&mut doc, &mut session, &chunk, &lines(&["Un", "Deux"]), PlacementMode::Overlay);
        assert_eq!(report.overlays_created, 2);
        assert_eq!(report.replaced, 0);
        assert_eq!(session.overlays().len(), 2);
        assert_eq!(doc.text(nodes[0]).as_deref(), Some("One"));
        assert_eq!(doc.text(nodes[1]).as_deref(), Some("Two"));
        assert_eq!(doc.count_elements_with_class(OVERLAY_CLASS), 2);
        assert_eq!(doc.body_text(), "OneUnTwoDeux");
    }

    #[test]
    fn test_overlay_fewer_lines_only_covers_leading_nodes() {
        let (mut doc, nodes, chunk) =
            setup("<html><body><div><p>One</p><p>Two</p><p>Three</p></div></body></html>");
        let mut session = Session::new();

        let report = place_chunk(&mut doc, &mut session, &chunk, &lines(&["Un"]), PlacementMode::Overlay);
        assert_eq!(report.overlays_created, 1);
        assert_eq!(report.untranslated, 2);
        assert_eq!(session.overlays().len(), 1);
        assert_eq!(doc.count_elements_with_class(OVERLAY_CLASS), 1);
        assert_eq!(doc.body_text(), "OneUnTwoThree");
        assert_eq!(doc.text(nodes[1]).as_deref(), Some("Two"));
    }

    #[test]
    fn test_mode_from_show_below() {
        assert_eq!(PlacementMode::from_show_below(true), PlacementMode::Overlay);
        assert_eq!(PlacementMode::from_show_below(false), PlacementMode::Replace);
    }
}
