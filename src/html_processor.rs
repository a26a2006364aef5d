//! HTML处理模块
//!
//! 提供HTML解析、文本节点登记、DOM写回、下方译文元素的插入与清理以及序列化功能。
//!
//! 文本节点在首次被收集时分配一个不透明的 [`TextNodeId`]，同一节点在文档生命周期内
//! 始终对应同一个ID，分块、派发、写回与还原都以它作为关联键。

// 标准库导入
use std::collections::HashMap;
use std::rc::Rc;

// 第三方crate导入
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{create_element, NodeOrText, TreeSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

// 本地模块导入
use crate::api_constants::overlay_config::{OVERLAY_CLASS, OVERLAY_STYLE};
use crate::error::Result;
use crate::translation_error;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// 文本节点的不透明标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextNodeId(usize);

/// 已插入的下方译文元素标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(usize);

/// 可变的HTML文档
pub struct Document {
    dom: RcDom,
    /// 按ID下标保存的文本节点
    ///
    /// 持有句柄使节点地址在文档生命周期内不会被复用，`text_index`依赖这一点；
    /// 登记数量以页面中的文本节点数为上限，重复收集不会增长。
    text_nodes: Vec<Handle>,
    /// 节点地址到ID的映射，保证同一节点只登记一次
    text_index: HashMap<usize, TextNodeId>,
    /// 按ID下标保存的下方译文元素，移除后置为None；全部移除后整体清空
    overlays: Vec<Option<Handle>>,
    /// 仍在文档中的下方译文数量
    live_overlays: usize,
}

impl Document {
    /// 解析HTML字符串
    pub fn parse(html_content: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html_content.as_bytes())
            .map_err(|e| translation_error!(html_parse, e))?;

        Ok(Self {
            dom,
            text_nodes: Vec::new(),
            text_index: HashMap::new(),
            overlays: Vec::new(),
            live_overlays: 0,
        })
    }

    /// 文本收集的起点：`<body>`，文档没有body时退回到文档根节点
    pub fn root(&self) -> Handle {
        find_element(&self.dom.document, "body").unwrap_or_else(|| self.dom.document.clone())
    }

    /// 登记文本节点并返回其ID；重复登记返回同一个ID
    pub fn register_text_node(&mut self, node: &Handle) -> TextNodeId {
        let key = Rc::as_ptr(node) as usize;
        if let Some(id) = self.text_index.get(&key) {
            return *id;
        }

        let id = TextNodeId(self.text_nodes.len());
        self.text_nodes.push(node.clone());
        self.text_index.insert(key, id);
        id
    }

    /// 读取文本节点当前的值
    pub fn text(&self, id: TextNodeId) -> Option<String> {
        let node = self.text_nodes.get(id.0)?;
        match node.data {
            NodeData::Text { ref contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    /// 覆盖文本节点的值
    pub fn set_text(&self, id: TextNodeId, value: &str) -> bool {
        let Some(node) = self.text_nodes.get(id.0) else {
            return false;
        };

        match node.data {
            NodeData::Text { ref contents } => {
                let mut content_ref = contents.borrow_mut();
                content_ref.clear();
                content_ref.push_slice(value);
                true
            }
            _ => false,
        }
    }

    /// 文本节点所在的元素
    pub fn containing_element(&self, id: TextNodeId) -> Option<Handle> {
        let node = self.text_nodes.get(id.0)?;
        parent_of(node).filter(is_element)
    }

    /// 在文本节点所在元素之后插入一条下方译文
    ///
    /// 新元素插到所在元素的下一个兄弟之前；没有下一个兄弟时追加到祖父节点末尾。
    /// 所在元素没有父节点时不插入，返回None。
    pub fn insert_overlay_after(&mut self, id: TextNodeId, text: &str) -> Option<OverlayId> {
        let parent = self.containing_element(id)?;
        let grandparent = parent_of(&parent)?;

        let span = create_element(
            &self.dom,
            html_name("span"),
            vec![
                plain_attribute("class", OVERLAY_CLASS),
                plain_attribute("style", OVERLAY_STYLE),
            ],
        );
        self.dom
            .append(&span, NodeOrText::AppendText(StrTendril::from_slice(text)));

        match next_sibling(&grandparent, &parent) {
            Some(sibling) => self
                .dom
                .append_before_sibling(&sibling, NodeOrText::AppendNode(span.clone())),
            None => self
                .dom
                .append(&grandparent, NodeOrText::AppendNode(span.clone())),
        }

        let overlay_id = OverlayId(self.overlays.len());
        self.overlays.push(Some(span));
        self.live_overlays += 1;
        Some(overlay_id)
    }

    /// 从文档中移除下方译文元素；已移除的返回false
    ///
    /// 最后一个元素移除后槽位整体清空，之后新插入的元素从0重新编号，
    /// 旧的ID此时都已失效。
    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        let Some(span) = self.overlays.get_mut(id.0).and_then(Option::take) else {
            return false;
        };

        self.dom.remove_from_parent(&span);
        self.live_overlays -= 1;
        if self.live_overlays == 0 {
            self.overlays.clear();
        }
        true
    }

    /// 已分配的下方译文槽位数
    pub fn overlay_slots(&self) -> usize {
        self.overlays.len()
    }

    /// 下方译文元素的文本
    pub fn overlay_text(&self, id: OverlayId) -> Option<String> {
        self.overlays
            .get(id.0)
            .and_then(Option::as_ref)
            .map(collect_text)
    }

    /// `<body>`下全部文本拼接（不含任何分隔）
    pub fn body_text(&self) -> String {
        collect_text(&self.root())
    }

    /// 按class统计文档中的元素数量
    pub fn count_elements_with_class(&self, class_name: &str) -> usize {
        let mut count = 0;
        let mut stack = vec![self.dom.document.clone()];
        while let Some(node) = stack.pop() {
            if get_node_attr(&node, "class")
                .map(|value| value.split_whitespace().any(|c| c == class_name))
                .unwrap_or(false)
            {
                count += 1;
            }
            stack.extend(node.children.borrow().iter().cloned());
        }
        count
    }

    /// 序列化为HTML字符串
    pub fn serialize(&self) -> Result<String> {
        serialize_dom_to_html(&self.dom)
    }
}

/// 序列化DOM为HTML字符串
pub fn serialize_dom_to_html(dom: &RcDom) -> Result<String> {
    use html5ever::serialize::{serialize, SerializeOpts};
    use std::io::Cursor;

    let mut buffer = Vec::new();
    let cursor = Cursor::new(&mut buffer);

    serialize(
        cursor,
        &SerializableHandle::from(dom.document.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| translation_error!(html_parse, format!("HTML序列化失败: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| translation_error!(html_parse, format!("UTF-8转换失败: {}", e)))
}

/// 获取父节点
pub(crate) fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take()?;
    let parent = weak.upgrade();
    node.parent.set(Some(weak));
    parent
}

/// 获取元素标签名
pub(crate) fn get_node_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

/// 获取元素属性
pub(crate) fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub(crate) fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

fn find_element(node: &Handle, tag_name: &str) -> Option<Handle> {
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if get_node_name(&current) == Some(tag_name) {
            return Some(current);
        }
        stack.extend(current.children.borrow().iter().rev().cloned());
    }
    None
}

fn next_sibling(parent: &Handle, child: &Handle) -> Option<Handle> {
    let children = parent.children.borrow();
    let index = children.iter().position(|c| Rc::ptr_eq(c, child))?;
    children.get(index + 1).cloned()
}

fn collect_text(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if let NodeData::Text { ref contents } = current.data {
            text.push_str(&contents.borrow());
        }
        stack.extend(current.children.borrow().iter().rev().cloned());
    }
    text
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn plain_attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}
