//! 文本分块
//!
//! 贪心地把文本节点按顺序装入大小受限的分块，每个分块对应一次后端请求。

use crate::api_constants::service_config::LINE_SEPARATOR;
use crate::html_processor::TextNodeId;

/// 分块中的一项：文本节点及其去除首尾空白后的原文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub node: TextNodeId,
    pub text: String,
}

/// 一次后端请求的文本批次
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    entries: Vec<ChunkEntry>,
    text: String,
    /// 已累计长度：每项字符数加一个分隔符
    accumulated: usize,
}

impl Chunk {
    fn push(&mut self, node: TextNodeId, text: String) {
        let length = text.chars().count();
        if !self.entries.is_empty() {
            self.text.push(LINE_SEPARATOR);
        }
        self.text.push_str(&text);
        self.accumulated += length + 1;
        self.entries.push(ChunkEntry { node, text });
    }

    /// 分块内的条目，顺序与文档顺序一致
    pub fn entries(&self) -> &[ChunkEntry] {
        &self.entries
    }

    /// 以换行连接的请求文本
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 请求文本的字符数
    pub fn char_len(&self) -> usize {
        self.accumulated.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 把文本节点分组为分块
///
/// 单次遍历、不重排：若当前分块已累计长度加上本项长度超过`max_chunk_chars`
/// 且当前分块非空，则先结束当前分块再追加。单个超长节点独占一个分块，不会被拆分。
pub fn create_chunks(nodes: &[(TextNodeId, String)], max_chunk_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk::default();

    for (node, value) in nodes {
        let text = value.trim().to_string();
        let length = text.chars().count();

        if current.accumulated + length > max_chunk_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        current.push(*node, text);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
