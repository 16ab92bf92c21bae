// ==========================================
// 生产计划工作流 - 导入层
// ==========================================
// 职责: 解析上期结果 XML,提取预测值/仓库库存,编辑后原样导出
// 红线: 未识别的元素原样保留,导出时不丢失
// ==========================================

pub mod error;
pub mod planning_document;
pub mod xml_tree;

pub use error::{XmlError, XmlResult};
pub use planning_document::{PlanningDocument, WAREHOUSE_ARTICLE_FIELDS};
pub use xml_tree::XmlNode;
