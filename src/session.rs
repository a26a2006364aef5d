//! 页面会话状态
//!
//! 保存最近一次翻译前的原文快照与下方译文元素，用于还原。
//! 会话的生命周期与页面相同，只会被新的一次翻译覆盖。

use tracing::{debug, info};

use crate::config::RestorePolicy;
use crate::error::{Result, TranslationError};
use crate::html_processor::{Document, OverlayId, TextNodeId};
use crate::placement::PlacementMode;

/// 还原结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub nodes_restored: usize,
    pub overlays_removed: usize,
}

/// 页面会话
#[derive(Debug, Default)]
pub struct Session {
    /// 按收集顺序保存的原文快照
    snapshot: Option<Vec<(TextNodeId, String)>>,
    /// 当前仍在文档中的下方译文元素
    overlays: Vec<OverlayId>,
    /// 最近一次翻译使用的写回模式
    last_mode: Option<PlacementMode>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在写回之前记录文本节点的当前值，覆盖上一次的快照
    pub fn capture(
        &mut self,
        document: &Document,
        nodes: &[TextNodeId],
        mode: PlacementMode,
    ) -> &[(TextNodeId, String)] {
        let snapshot: Vec<(TextNodeId, String)> = nodes
            .iter()
            .filter_map(|id| document.text(*id).map(|value| (*id, value)))
            .collect();

        info!("💾 已保存 {} 个文本节点的原文", snapshot.len());
        self.last_mode = Some(mode);
        self.snapshot.insert(snapshot)
    }

    pub fn snapshot(&self) -> Option<&[(TextNodeId, String)]> {
        self.snapshot.as_deref()
    }

    pub fn overlays(&self) -> &[OverlayId] {
        &self.overlays
    }

    pub(crate) fn record_overlay(&mut self, overlay: OverlayId) {
        self.overlays.push(overlay);
    }

    /// 从文档中移除全部下方译文元素，返回移除数量
    pub fn clear_overlays(&mut self, document: &mut Document) -> usize {
        let removed = self
            .overlays
            .drain(..)
            .filter(|overlay| document.remove_overlay(*overlay))
            .count();

        if removed > 0 {
            info!("🧹 已移除 {} 个下方译文元素", removed);
        }
        debug!("下方译文槽位: {}", document.overlay_slots());
        removed
    }

    /// 把快照中的原文逐个写回
    ///
    /// 快照不会被清除，连续还原两次与还原一次效果相同。
    pub fn restore(&mut self, document: &mut Document, policy: RestorePolicy) -> Result<RestoreReport> {
        let snapshot = self.snapshot.as_ref().ok_or(TranslationError::NoSnapshot)?;

        info!("↩️  正在还原 {} 个文本节点", snapshot.len());
        let nodes_restored = snapshot
            .iter()
            .filter(|(id, original)| document.set_text(*id, original))
            .count();

        let overlays_removed = match (policy, self.last_mode) {
            (RestorePolicy::RemoveOverlays, Some(PlacementMode::Overlay)) => {
                self.clear_overlays(document)
            }
            _ => 0,
        };

        info!("✅ 还原完成");
        Ok(RestoreReport {
            nodes_restored,
            overlays_removed,
        })
    }
}
