//! 可见文本节点收集
//!
//! 从`<body>`开始深度优先遍历，按文档顺序返回全部可翻译的文本节点。
//! 收集结果的顺序即后续分块与写回的顺序。

// 标准库导入
use std::sync::OnceLock;

// 第三方crate导入
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;
use tracing::debug;

// 本地模块导入
use crate::api_constants::overlay_config::SKIPPED_TAGS;
use crate::html_processor::{get_node_attr, get_node_name, is_element, parent_of, Document, TextNodeId};

/// 从内联样式推断出的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct InlineVisibility {
    display_none: bool,
    /// Some(true)表示hidden/collapse，Some(false)表示显式visible，None表示未声明
    visibility_hidden: Option<bool>,
}

fn style_declaration_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:^|;)\s*(display|visibility)\s*:\s*([a-z-]+)")
            .expect("style declaration regex is valid")
    })
}

fn inline_visibility(element: &Handle) -> InlineVisibility {
    let mut visibility = InlineVisibility {
        display_none: get_node_attr(element, "hidden").is_some(),
        visibility_hidden: None,
    };

    let Some(style) = get_node_attr(element, "style") else {
        return visibility;
    };

    // 同一属性多次声明时以最后一次为准
    for captures in style_declaration_regex().captures_iter(&style) {
        let property = captures[1].to_ascii_lowercase();
        let value = captures[2].to_ascii_lowercase();
        match property.as_str() {
            "display" => visibility.display_none = value == "none",
            "visibility" => {
                visibility.visibility_hidden = Some(value == "hidden" || value == "collapse")
            }
            _ => {}
        }
    }

    visibility
}

/// 元素是否在跳过列表中
fn is_skipped_tag(element: &Handle) -> bool {
    get_node_name(element)
        .map(|name| SKIPPED_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag)))
        .unwrap_or(false)
}

/// 收集文档中全部可见且非空的文本节点
///
/// 满足以下全部条件的文本节点才会被收集：
/// - 去除首尾空白后非空；
/// - 存在所在元素；
/// - 所在元素及其祖先都不是 `script`、`style`、`noscript`、`iframe`、`object`；
/// - 所在元素的计算样式既不是`display: none`也不是`visibility: hidden`。
///
/// `display: none`与`hidden`属性会隐藏整个子树，`visibility`按继承规则计算，
/// 子元素可以用`visibility: visible`重新显示。
pub fn collect_text_nodes(document: &mut Document) -> Vec<TextNodeId> {
    let mut accepted: Vec<Handle> = Vec::new();
    // (节点, 继承到的visibility: hidden)
    let mut stack: Vec<(Handle, bool)> = vec![(document.root(), false)];

    while let Some((node, inherited_hidden)) = stack.pop() {
        let mut hidden = inherited_hidden;

        match node.data {
            NodeData::Text { ref contents } => {
                if !hidden && !contents.borrow().trim().is_empty() && has_containing_element(&node) {
                    accepted.push(node.clone());
                }
                continue;
            }
            NodeData::Element { .. } => {
                if is_skipped_tag(&node) {
                    continue;
                }
                let visibility = inline_visibility(&node);
                if visibility.display_none {
                    continue;
                }
                if let Some(value) = visibility.visibility_hidden {
                    hidden = value;
                }
            }
            _ => {}
        }

        for child in node.children.borrow().iter().rev() {
            stack.push((child.clone(), hidden));
        }
    }

    debug!("🔍 收集到 {} 个可见文本节点", accepted.len());

    accepted
        .iter()
        .map(|node| document.register_text_node(node))
        .collect()
}

fn has_containing_element(node: &Handle) -> bool {
    parent_of(node).map(|parent| is_element(&parent)).unwrap_or(false)
}
