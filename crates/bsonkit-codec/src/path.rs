//! 键路径追踪
//!
//! 编码过程中维护当前位置的路径栈，只在出错时渲染为字符串，
//! 正常路径上不分配内存。

use std::fmt::Write;

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

#[derive(Debug, Default)]
pub(crate) struct KeyPath<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> KeyPath<'a> {
    pub(crate) fn new() -> Self {
        Self {
            segments: Vec::with_capacity(8),
        }
    }

    pub(crate) fn push_key(&mut self, key: &'a str) {
        self.segments.push(Segment::Key(key));
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    /// 渲染为 `a.b[2].c` 形式，根位置为空字符串
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Index(index) => {
                    let _ = write!(out, "[{}]", index);
                }
            }
        }
        out
    }
}
