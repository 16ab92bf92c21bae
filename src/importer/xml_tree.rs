// ==========================================
// 生产计划工作流 - 通用 XML 树
// ==========================================
// 职责: XML 文本 <-> 元素树（名称/属性/文本/子元素）
// 工具: quick-xml 事件流
// 说明: 注释、处理指令、DOCTYPE 不保留;属性顺序保留
// ==========================================

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use serde::{Deserialize, Serialize};

use crate::importer::error::{XmlError, XmlResult};

/// XML 元素节点
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    // ==========================================
    // 属性
    // ==========================================

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 设置属性（已存在则原位替换,保持属性顺序）
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    // ==========================================
    // 子元素
    // ==========================================

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// 同名子元素中的第 index 个
    pub fn nth_child_mut(&mut self, name: &str, index: usize) -> Option<&mut XmlNode> {
        self.children
            .iter_mut()
            .filter(|c| c.name == name)
            .nth(index)
    }

    /// 字段值: 优先取属性,其次取同名子元素文本
    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.attr(field)
            .or_else(|| self.child(field).and_then(|c| c.text.as_deref()))
    }

    /// 写字段值: 属性存在写属性,子元素存在写子元素文本,否则新增属性
    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        if self.attr(field).is_some() {
            self.set_attr(field, value);
        } else if let Some(child) = self.child_mut(field) {
            child.text = Some(value);
        } else {
            self.set_attr(field, value);
        }
    }

    // ==========================================
    // 解析 / 生成
    // ==========================================

    /// 解析 XML 文本,返回根元素
    pub fn parse(xml: &str) -> XmlResult<XmlNode> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(XmlError::Parse {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    })
                }
            };

            match event {
                Event::Start(start) => stack.push(node_from_start(&start)?),
                Event::Empty(start) => {
                    let node = node_from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("多余的结束标签".to_string()))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    append_text(&mut stack, &value);
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    append_text(&mut stack, &value);
                }
                Event::Eof => break,
                // 声明、注释、处理指令、DOCTYPE 跳过
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Malformed(format!("元素未闭合: {}", open.name)));
        }
        root.ok_or_else(|| XmlError::MissingElement("根元素".to_string()))
    }

    /// 生成带声明、两空格缩进的 XML 文本
    pub fn to_xml_string(&self) -> XmlResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(build_error)?;
        write_node(&mut writer, self)?;

        String::from_utf8(writer.into_inner()).map_err(build_error)
    }
}

fn node_from_start(start: &BytesStart) -> XmlResult<XmlNode> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(XmlError::Malformed(format!("存在多个根元素: {}", node.name)))
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlNode], value: &str) {
    // 根元素外的文本忽略
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(value);
    }
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> XmlResult<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        return writer.write_event(Event::Empty(start)).map_err(build_error);
    }

    writer.write_event(Event::Start(start)).map_err(build_error)?;
    if let Some(text) = &node.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(build_error)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(build_error)
}

fn build_error<E: std::fmt::Display>(e: E) -> XmlError {
    XmlError::Build(e.to_string())
}
