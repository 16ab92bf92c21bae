// ==========================================
// 生产计划工作流 - 预测与库存领域模型
// ==========================================
// 职责: 预测值（三个产品的首期需求）与仓库库存清单
// 说明: 两者均不属于任何单一阶段,由 XML 导入写入存储,
//       生产计划/物料计划阶段只读使用
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Forecast - 预测值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub p1: String, // P1 儿童车
    pub p2: String, // P2 女士车
    pub p3: String, // P3 男士车
}

impl Forecast {
    pub fn new(p1: impl Into<String>, p2: impl Into<String>, p3: impl Into<String>) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
            p3: p3.into(),
        }
    }

    /// 按产品编号取预测值（P1/P2/P3）
    pub fn for_product(&self, product_id: &str) -> Option<&str> {
        match product_id {
            "P1" => Some(&self.p1),
            "P2" => Some(&self.p2),
            "P3" => Some(&self.p3),
            _ => None,
        }
    }
}

impl Default for Forecast {
    fn default() -> Self {
        Self::new("200", "150", "100")
    }
}

// ==========================================
// WarehouseStock - 仓库库存
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseArticle {
    pub id: String,
    pub amount: String,
    pub start_amount: String,
    pub pct: String,
    pub price: String,
    pub stock_value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStock {
    pub articles: Vec<WarehouseArticle>,
    pub total_stock_value: Option<String>,
}

impl WarehouseStock {
    /// 按物料号查找库存（"E26" / "26" 均可）
    pub fn find(&self, article_id: &str) -> Option<&WarehouseArticle> {
        let wanted = normalize_article_id(article_id);
        self.articles
            .iter()
            .find(|a| normalize_article_id(&a.id) == wanted)
    }

    /// 物料当前库存数量
    pub fn amount_of(&self, article_id: &str) -> Option<&str> {
        self.find(article_id).map(|a| a.amount.as_str())
    }
}

/// 去掉物料号的字母前缀与尾部标记（"E26*" -> "26"）
fn normalize_article_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_digit()).collect()
}
