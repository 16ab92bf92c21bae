// ==========================================
// 生产计划工作流 - 上期结果文档
// ==========================================
// 职责: 包装 XML 树,读取/编辑 预测值、仓库库存,导出
// 输入: results 根元素（game/group/period 属性）
// 红线: 只修改被编辑的字段,其余内容原样导出
// ==========================================

use std::path::Path;

use crate::domain::forecast::{Forecast, WarehouseArticle, WarehouseStock};
use crate::importer::error::{XmlError, XmlResult};
use crate::importer::xml_tree::XmlNode;

/// 根元素名
pub const ROOT_ELEMENT: &str = "results";

/// 仓库物料可编辑字段
pub const WAREHOUSE_ARTICLE_FIELDS: [&str; 5] = ["amount", "startamount", "pct", "price", "stockvalue"];

const FORECAST_FIELDS: [&str; 3] = ["p1", "p2", "p3"];

#[derive(Debug, Clone, PartialEq)]
pub struct PlanningDocument {
    root: XmlNode,
}

impl PlanningDocument {
    /// 解析 XML 文本
    ///
    /// # 错误
    /// - Parse / Malformed: 文本不是合法 XML
    /// - MissingElement: 根元素不是 results
    pub fn parse(xml: &str) -> XmlResult<Self> {
        let root = XmlNode::parse(xml)?;
        Self::from_root(root)
    }

    pub fn from_root(root: XmlNode) -> XmlResult<Self> {
        if root.name != ROOT_ELEMENT {
            return Err(XmlError::MissingElement(format!(
                "{}（实际根元素: {}）",
                ROOT_ELEMENT, root.name
            )));
        }
        Ok(Self { root })
    }

    pub fn from_file(path: &Path) -> XmlResult<Self> {
        let xml = std::fs::read_to_string(path)?;
        let document = Self::parse(&xml)?;
        tracing::info!(
            "XML 导入完成: file={}, game={:?}, group={:?}, period={:?}",
            path.display(),
            document.game(),
            document.group(),
            document.period()
        );
        Ok(document)
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    // ==========================================
    // 基本信息
    // ==========================================

    pub fn game(&self) -> Option<&str> {
        self.root.attr("game")
    }

    pub fn group(&self) -> Option<&str> {
        self.root.attr("group")
    }

    pub fn period(&self) -> Option<&str> {
        self.root.attr("period")
    }

    /// 下一个计划期（当前期 + 1;期间号无法解析或溢出时为 None）
    pub fn next_period(&self) -> Option<u32> {
        self.period()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .and_then(|p| p.checked_add(1))
    }

    // ==========================================
    // 预测值
    // ==========================================

    pub fn forecast(&self) -> XmlResult<Forecast> {
        let node = self
            .root
            .child("forecast")
            .ok_or_else(|| XmlError::MissingElement("forecast".to_string()))?;

        let value = |field: &str| {
            node.value_of(field)
                .map(str::to_string)
                .ok_or_else(|| XmlError::MissingElement(format!("forecast.{}", field)))
        };
        Ok(Forecast::new(value("p1")?, value("p2")?, value("p3")?))
    }

    /// 修改单个产品预测值（p1/p2/p3）
    pub fn set_forecast_value(&mut self, product: &str, value: &str) -> XmlResult<()> {
        let field = product.trim().to_ascii_lowercase();
        if !FORECAST_FIELDS.contains(&field.as_str()) {
            return Err(XmlError::UnknownField(format!("forecast.{}", product)));
        }
        self.set_path(&format!("forecast.{}", field), value)
    }

    pub fn set_forecast(&mut self, forecast: &Forecast) -> XmlResult<()> {
        self.set_forecast_value("p1", &forecast.p1)?;
        self.set_forecast_value("p2", &forecast.p2)?;
        self.set_forecast_value("p3", &forecast.p3)
    }

    // ==========================================
    // 仓库库存
    // ==========================================

    /// 仓库库存（文档中无 warehousestock 时为 None）
    pub fn warehouse_stock(&self) -> Option<WarehouseStock> {
        let node = self.root.child("warehousestock")?;
        let field = |article: &XmlNode, name: &str| {
            article.value_of(name).unwrap_or_default().to_string()
        };

        let articles = node
            .children_named("article")
            .map(|article| WarehouseArticle {
                id: field(article, "id"),
                amount: field(article, "amount"),
                start_amount: field(article, "startamount"),
                pct: field(article, "pct"),
                price: field(article, "price"),
                stock_value: field(article, "stockvalue"),
            })
            .collect();

        Some(WarehouseStock {
            articles,
            total_stock_value: node.value_of("totalstockvalue").map(str::to_string),
        })
    }

    /// 修改第 index 个仓库物料的字段
    pub fn set_warehouse_field(&mut self, index: usize, field: &str, value: &str) -> XmlResult<()> {
        if !WAREHOUSE_ARTICLE_FIELDS.contains(&field) {
            return Err(XmlError::UnknownField(format!("warehousestock.article.{}", field)));
        }
        self.set_path(&format!("warehousestock.article.{}.{}", index, field), value)
    }

    // ==========================================
    // 通用路径编辑
    // ==========================================

    /// 按路径写字段值
    ///
    /// 路径格式: `元素[.索引].元素[.索引]...字段`,相对根元素,
    /// 例如 `forecast.p1`、`warehousestock.article.3.amount`、`warehousestock.totalstockvalue`
    pub fn set_path(&mut self, path: &str, value: &str) -> XmlResult<()> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let (field, elements) = segments
            .split_last()
            .ok_or_else(|| XmlError::UnknownField(path.to_string()))?;

        let mut node = &mut self.root;
        let mut i = 0;
        while i < elements.len() {
            let name = elements[i];
            let index = match elements.get(i + 1).and_then(|s| s.parse::<usize>().ok()) {
                Some(index) => {
                    i += 1;
                    index
                }
                None => 0,
            };
            i += 1;

            let len = node.children_named(name).count();
            if len == 0 {
                return Err(XmlError::MissingElement(name.to_string()));
            }
            node = node
                .nth_child_mut(name, index)
                .ok_or_else(|| XmlError::IndexOutOfRange {
                    name: name.to_string(),
                    index,
                    len,
                })?;
        }

        tracing::debug!("XML 字段更新: {} = {}", path, value);
        node.set_value(field, value);
        Ok(())
    }

    // ==========================================
    // 导出
    // ==========================================

    pub fn to_xml(&self) -> XmlResult<String> {
        self.root.to_xml_string()
    }

    pub fn write_to_file(&self, path: &Path) -> XmlResult<()> {
        let xml = self.to_xml()?;
        std::fs::write(path, xml)?;
        tracing::info!("XML 导出完成: file={}", path.display());
        Ok(())
    }
}
