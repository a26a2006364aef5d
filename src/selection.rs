//! 划词翻译浮层
//!
//! 事件驱动的状态机，管理选区旁的翻译图标与翻译弹窗：
//!
//! ```text
//! Idle ──选中文本──▶ IconVisible ──点击图标──▶ Translating ──完成/失败──▶ PopupShown
//!   ▲                    │  ▲                                                │
//!   └──选区清空(防抖)────┘  └──────────────────新的选区───────────────────────┤
//!   ▲                                                                         │
//!   └───────────────────────────────点击关闭──────────────────────────────────┘
//! ```
//!
//! 宿主负责提供选区矩形、视口信息和弹窗实际尺寸；状态机只计算图标、弹窗的位置与内容。
//! 所有坐标都以页面坐标表示（视口坐标加滚动偏移）。

use tracing::{debug, info};

use crate::api_constants::selection_config::{
    ICON_GAP_Y, ICON_OFFSET_X, POPUP_GAP_Y, POPUP_MARGIN, SELECTION_DEBOUNCE,
};
use crate::backend::TranslationBackend;
use crate::error::Result;

/// 视口坐标下的矩形
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// 视口尺寸与滚动偏移
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// 页面坐标
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// 当前选区
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// 去除首尾空白后的选中文本
    pub text: String,
    /// 选区在视口中的包围矩形
    pub bounds: Rect,
}

impl Selection {
    pub fn new(text: &str, bounds: Rect) -> Self {
        Self {
            text: text.trim().to_string(),
            bounds,
        }
    }
}

/// 浮层状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Idle,
    IconVisible,
    Translating,
    PopupShown { error: bool },
}

/// 弹窗内容
#[derive(Debug, Clone, PartialEq)]
pub enum PopupContent {
    /// 等待翻译结果
    Loading,
    /// 原文与译文，附关闭按钮
    Translation {
        original: String,
        translated: String,
        target_language: String,
    },
    /// 错误消息，以错误样式显示
    Error(String),
}

impl PopupContent {
    pub fn is_error(&self) -> bool {
        matches!(self, PopupContent::Error(_))
    }

    /// 是否带关闭按钮
    pub fn has_close_control(&self) -> bool {
        matches!(self, PopupContent::Translation { .. } | PopupContent::Error(_))
    }
}

/// 弹窗视图
#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    pub position: Position,
    pub content: PopupContent,
}

/// 选区清空的防抖凭证
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// 一次划词翻译请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    id: u64,
    pub text: String,
}

/// 划词翻译浮层状态机
#[derive(Debug, Default)]
pub struct SelectionOverlay {
    state: OverlayState,
    selection: Option<Selection>,
    viewport: Viewport,
    icon: Option<Position>,
    popup: Option<PopupView>,
    debounce_generation: u64,
    request_generation: u64,
}

impl SelectionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// 可见时返回图标位置
    pub fn icon(&self) -> Option<Position> {
        self.icon
    }

    /// 可见时返回弹窗
    pub fn popup(&self) -> Option<&PopupView> {
        self.popup.as_ref()
    }

    /// 鼠标抬起后上报当前选区
    ///
    /// 非空选区把图标移动到选区底部中央并隐藏旧弹窗；空选区回到Idle。
    pub fn on_selection(&mut self, selection: Option<Selection>, viewport: Viewport) {
        self.viewport = viewport;
        self.debounce_generation += 1;

        let Some(selection) = selection.filter(|s| !s.text.is_empty()) else {
            self.reset();
            return;
        };

        let bounds = selection.bounds;
        self.icon = Some(Position {
            left: bounds.left + bounds.width / 2.0 - ICON_OFFSET_X + viewport.scroll_x,
            top: bounds.bottom() + ICON_GAP_Y + viewport.scroll_y,
        });
        self.popup = None;
        self.selection = Some(selection);
        // 进行中的请求结果作废
        self.request_generation += 1;
        self.state = OverlayState::IconVisible;
    }

    /// 选区变化事件
    ///
    /// 选区变为空时返回防抖凭证，宿主应在防抖时间后调用[`Self::on_debounce_elapsed`]；
    /// 期间的任何新事件都会让该凭证失效。
    pub fn on_selection_change(&mut self, current_text: &str) -> Option<DebounceTicket> {
        self.debounce_generation += 1;
        if current_text.trim().is_empty() {
            Some(DebounceTicket(self.debounce_generation))
        } else {
            None
        }
    }

    /// 防抖结束时复核选区；仍为空则隐藏图标与弹窗
    pub fn on_debounce_elapsed(&mut self, ticket: DebounceTicket, current_text: &str) -> bool {
        if ticket.0 != self.debounce_generation || !current_text.trim().is_empty() {
            return false;
        }
        if self.state != OverlayState::Idle {
            debug!("选区已清空，隐藏划词翻译浮层");
        }
        self.reset();
        true
    }

    /// 图标上的mousedown需要阻止默认行为，否则浏览器会在click之前清除选区
    pub fn on_icon_mouse_down(&self) -> bool {
        self.icon.is_some()
    }

    /// 点击图标：进入Translating并显示加载中的弹窗
    pub fn on_icon_click(&mut self) -> Option<SelectionRequest> {
        if !matches!(
            self.state,
            OverlayState::IconVisible | OverlayState::PopupShown { .. }
        ) {
            return None;
        }
        let text = self.selection.as_ref()?.text.clone();

        self.request_generation += 1;
        self.state = OverlayState::Translating;
        self.show_popup(PopupContent::Loading);

        Some(SelectionRequest {
            id: self.request_generation,
            text,
        })
    }

    /// 翻译完成；过期请求（期间选区已变化或已关闭）的结果被忽略
    pub fn on_translation_finished(
        &mut self,
        request: &SelectionRequest,
        target_language: &str,
        result: Result<String>,
    ) -> bool {
        if self.state != OverlayState::Translating || request.id != self.request_generation {
            return false;
        }

        let content = match result {
            Ok(translated) => PopupContent::Translation {
                original: request.text.clone(),
                translated,
                target_language: target_language.to_string(),
            },
            Err(e) => PopupContent::Error(e.user_message()),
        };

        self.state = OverlayState::PopupShown {
            error: content.is_error(),
        };
        self.show_popup(content);
        true
    }

    /// 宿主渲染弹窗后上报实际尺寸，超出视口时调整位置
    ///
    /// 右侧溢出时左移到视口内；底部溢出时翻到选区上方。
    pub fn on_popup_measured(&mut self, width: f64, height: f64) {
        let viewport = self.viewport;
        let Some(bounds) = self.selection.as_ref().map(|s| s.bounds) else {
            return;
        };
        let Some(popup) = self.popup.as_mut() else {
            return;
        };

        let viewport_left = popup.position.left - viewport.scroll_x;
        let viewport_top = popup.position.top - viewport.scroll_y;

        if viewport_left + width > viewport.width {
            popup.position.left = viewport.width - width - POPUP_MARGIN + viewport.scroll_x;
        }
        if viewport_top + height > viewport.height {
            popup.position.top = bounds.top - height - POPUP_MARGIN + viewport.scroll_y;
        }
    }

    /// 点击弹窗的关闭按钮
    pub fn on_close_click(&mut self) -> bool {
        if !matches!(self.state, OverlayState::PopupShown { .. }) {
            return false;
        }
        self.reset();
        true
    }

    /// 点击图标并用给定后端完成翻译
    ///
    /// 后端解析失败（例如未配置API密钥）时直接显示错误弹窗。
    pub async fn translate_with<B: TranslationBackend>(
        &mut self,
        backend: Result<&B>,
        target_language: &str,
    ) -> bool {
        let Some(request) = self.on_icon_click() else {
            return false;
        };

        info!("🔤 划词翻译: {} 字符", request.text.chars().count());
        let result = match backend {
            Ok(backend) => backend.translate(&request.text, target_language).await,
            Err(e) => Err(e),
        };
        self.on_translation_finished(&request, target_language, result)
    }

    /// 等待防抖时间后复核选区
    pub async fn settle_selection_change<F>(&mut self, ticket: DebounceTicket, current_text: F) -> bool
    where
        F: FnOnce() -> String,
    {
        tokio::time::sleep(SELECTION_DEBOUNCE).await;
        let text = current_text();
        self.on_debounce_elapsed(ticket, &text)
    }

    fn show_popup(&mut self, content: PopupContent) {
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        let bounds = selection.bounds;
        self.popup = Some(PopupView {
            position: Position {
                left: bounds.left + self.viewport.scroll_x,
                top: bounds.bottom() + POPUP_GAP_Y + self.viewport.scroll_y,
            },
            content,
        });
    }

    fn reset(&mut self) {
        self.state = OverlayState::Idle;
        self.selection = None;
        self.icon = None;
        self.popup = None;
        self.request_generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation_error;
    use crate::translator::test_support::MockBackend;

    fn viewport() -> Viewport {
        Viewport {
            width: 1024.0,
            height: 768.0,
            scroll_x: 0.0,
            scroll_y: 200.0,
        }
    }

    fn hello_world() -> Selection {
        Selection::new(" Hello world ", Rect::new(100.0, 50.0, 80.0, 20.0))
    }

    #[test]
    fn test_selection_shows_icon_at_bottom_center() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());

        assert_eq!(overlay.state(), OverlayState::IconVisible);
        assert_eq!(overlay.selection().unwrap().text, "Hello world");
        assert_eq!(
            overlay.icon(),
            Some(Position {
                left: 100.0 + 40.0 - 16.0,
                top: 70.0 + 5.0 + 200.0
            })
        );
        assert!(overlay.popup().is_none());
        assert!(overlay.on_icon_mouse_down());
    }

    #[test]
    fn test_full_success_flow() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());

        let request = overlay.on_icon_click().unwrap();
        assert_eq!(request.text, "Hello world");
        assert_eq!(overlay.state(), OverlayState::Translating);
        let popup = overlay.popup().unwrap();
        assert_eq!(popup.content, PopupContent::Loading);
        assert_eq!(popup.position, Position { left: 100.0, top: 70.0 + 40.0 + 200.0 });

        assert!(overlay.on_translation_finished(&request, "French", Ok("Bonjour le monde".to_string())));
        assert_eq!(overlay.state(), OverlayState::PopupShown { error: false });
        let popup = overlay.popup().unwrap();
        assert_eq!(
            popup.content,
            PopupContent::Translation {
                original: "Hello world".to_string(),
                translated: "Bonjour le monde".to_string(),
                target_language: "French".to_string(),
            }
        );
        assert!(popup.content.has_close_control());

        assert!(overlay.on_close_click());
        assert_eq!(overlay.state(), OverlayState::Idle);
        assert!(overlay.icon().is_none());
        assert!(overlay.popup().is_none());
    }

    #[test]
    fn test_backend_error_shows_verbatim_message() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        let request = overlay.on_icon_click().unwrap();

        let err = translation_error!(backend, "Invalid API key", 401);
        overlay.on_translation_finished(&request, "French", Err(err));

        assert_eq!(overlay.state(), OverlayState::PopupShown { error: true });
        let popup = overlay.popup().unwrap();
        assert_eq!(popup.content, PopupContent::Error("Invalid API key".to_string()));
        assert!(popup.content.is_error());
        // 选区保持不变，直到下一次交互
        assert_eq!(overlay.selection().unwrap().text, "Hello world");
    }

    #[test]
    fn test_empty_selection_goes_idle() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        overlay.on_selection(Some(Selection::new("   ", Rect::default())), viewport());
        assert_eq!(overlay.state(), OverlayState::Idle);
        assert!(overlay.on_icon_click().is_none());
    }

    #[test]
    fn test_debounce_only_hides_when_still_empty() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());

        let ticket = overlay.on_selection_change("").unwrap();
        // 用户仍在选择
        assert!(!overlay.on_debounce_elapsed(ticket, "Hello"));
        assert_eq!(overlay.state(), OverlayState::IconVisible);

        let stale = overlay.on_selection_change("").unwrap();
        let fresh = overlay.on_selection_change("").unwrap();
        assert!(!overlay.on_debounce_elapsed(stale, ""));
        assert!(overlay.on_debounce_elapsed(fresh, ""));
        assert_eq!(overlay.state(), OverlayState::Idle);
    }

    #[test]
    fn test_non_empty_change_yields_no_ticket() {
        let mut overlay = SelectionOverlay::new();
        assert!(overlay.on_selection_change("partial").is_none());
    }

    #[test]
    fn test_new_selection_discards_in_flight_result() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        let request = overlay.on_icon_click().unwrap();

        overlay.on_selection(
            Some(Selection::new("Other", Rect::new(10.0, 10.0, 30.0, 10.0))),
            viewport(),
        );
        assert!(!overlay.on_translation_finished(&request, "French", Ok("Autre".to_string())));
        assert_eq!(overlay.state(), OverlayState::IconVisible);
        assert!(overlay.popup().is_none());
    }

    #[test]
    fn test_popup_shown_until_explicit_close_or_new_selection() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        let request = overlay.on_icon_click().unwrap();
        overlay.on_translation_finished(&request, "French", Ok("Bonjour".to_string()));

        assert!(overlay.on_selection_change("Hello world").is_none());
        assert_eq!(overlay.state(), OverlayState::PopupShown { error: false });

        overlay.on_selection(Some(hello_world()), viewport());
        assert_eq!(overlay.state(), OverlayState::IconVisible);
        assert!(overlay.popup().is_none());
    }

    #[test]
    fn test_popup_repositioned_when_overflowing() {
        let mut overlay = SelectionOverlay::new();
        let small = Viewport {
            width: 400.0,
            height: 300.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        };
        overlay.on_selection(
            Some(Selection::new("Near the corner", Rect::new(300.0, 250.0, 50.0, 20.0))),
            small,
        );
        overlay.on_icon_click().unwrap();

        overlay.on_popup_measured(200.0, 100.0);
        let popup = overlay.popup().unwrap();
        assert_eq!(popup.position.left, 400.0 - 200.0 - 10.0);
        assert_eq!(popup.position.top, 250.0 - 100.0 - 10.0);
    }

    #[test]
    fn test_popup_not_moved_when_it_fits() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        overlay.on_icon_click().unwrap();
        let before = overlay.popup().unwrap().position;
        overlay.on_popup_measured(150.0, 80.0);
        assert_eq!(overlay.popup().unwrap().position, before);
    }

    #[tokio::test]
    async fn test_translate_with_backend() {
        let backend = MockBackend::with_prefix("FR:");
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());

        assert!(overlay.translate_with(Ok(&backend), "French").await);
        match &overlay.popup().unwrap().content {
            PopupContent::Translation { translated, .. } => assert_eq!(translated, "FR:Hello world"),
            other => panic!("unexpected popup: {other:?}"),
        }
        assert_eq!(backend.calls(), vec!["Hello world".to_string()]);
    }

    #[tokio::test]
    async fn test_translate_without_api_key_shows_error() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());

        let missing: Result<&MockBackend> = Err(translation_error!(
            config,
            crate::error::API_KEY_FIELD,
            crate::api_constants::error_messages::MISSING_API_KEY
        ));
        assert!(overlay.translate_with(missing, "French").await);
        assert_eq!(overlay.state(), OverlayState::PopupShown { error: true });
        assert!(matches!(
            overlay.popup().unwrap().content,
            PopupContent::Error(ref message) if message.contains(crate::api_constants::error_messages::MISSING_API_KEY)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_selection_change_waits_for_debounce() {
        let mut overlay = SelectionOverlay::new();
        overlay.on_selection(Some(hello_world()), viewport());
        let ticket = overlay.on_selection_change("").unwrap();

        let started = tokio::time::Instant::now();
        assert!(overlay.settle_selection_change(ticket, String::new).await);
        assert!(started.elapsed() >= SELECTION_DEBOUNCE);
        assert_eq!(overlay.state(), OverlayState::Idle);
    }
}
