// ==========================================
// 生产计划工作流 - 生产订单排序引擎
// ==========================================
// 职责: 生产排序阶段的订单勾选、拆分、上移/下移
// 输入: 订单列表（生产排序阶段数据）
// 输出: 新订单列表（调用方整体写回存储）
// ==========================================

use crate::domain::stage::{OrderItem, ProductionPlanningData};

/// 拆分后第二张订单的编号后缀
pub const SPLIT_SUFFIX: &str = "_split";

/// 移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

// ==========================================
// OrderSequencer - 生产订单排序引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OrderSequencer {
    // 无状态引擎
}

impl OrderSequencer {
    pub fn new() -> Self {
        Self {}
    }

    /// 切换订单勾选状态,返回是否找到该订单
    pub fn toggle_selection(&self, orders: &mut [OrderItem], order_id: &str) -> bool {
        match orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => {
                order.selected = !order.selected;
                true
            }
            None => false,
        }
    }

    /// 拆分所有已勾选订单
    ///
    /// 每张勾选订单拆为两张: floor(amount/2) 与剩余数量,
    /// 第二张编号追加 `_split`,拆分后均为未勾选;未勾选订单保持原位
    pub fn split_selected(&self, orders: &[OrderItem]) -> Vec<OrderItem> {
        let mut result = Vec::with_capacity(orders.len() * 2);
        for order in orders {
            if !order.selected {
                result.push(order.clone());
                continue;
            }

            let half = order.amount.div_euclid(2);
            let mut first = order.clone();
            first.amount = half;
            first.selected = false;

            let mut second = order.clone();
            second.id = format!("{}{}", order.id, SPLIT_SUFFIX);
            second.amount = order.amount - half;
            second.selected = false;

            tracing::debug!(
                "拆分订单: id={}, {} -> {} + {}",
                order.id,
                order.amount,
                first.amount,
                second.amount
            );
            result.push(first);
            result.push(second);
        }
        result
    }

    /// 上移/下移订单,越界时不动,返回是否发生移动
    pub fn move_order(&self, orders: &mut [OrderItem], index: usize, direction: MoveDirection) -> bool {
        match direction {
            MoveDirection::Up if index > 0 && index < orders.len() => {
                orders.swap(index, index - 1);
                true
            }
            MoveDirection::Down if index + 1 < orders.len() => {
                orders.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// 对阶段数据执行拆分（订单集合缺失时不变）
    pub fn split_in_payload(&self, data: &mut ProductionPlanningData) {
        if let Some(orders) = data.orders.as_ref() {
            data.orders = Some(self.split_selected(orders));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Vec<OrderItem> {
        vec![
            OrderItem::new("1", "16", 130),
            OrderItem::new("2", "17", 451),
            OrderItem::new("3", "26", 270),
        ]
    }

    #[test]
    fn test_split_selected_halves_amount() {
        let sequencer = OrderSequencer::new();
        let mut list = orders();
        assert!(sequencer.toggle_selection(&mut list, "2"));

        let split = sequencer.split_selected(&list);

        let summary: Vec<_> = split.iter().map(|o| (o.id.as_str(), o.amount)).collect();
        assert_eq!(
            summary,
            vec![("1", 130), ("2", 225), ("2_split", 226), ("3", 270)]
        );
        assert!(split.iter().all(|o| !o.selected));
        assert_eq!(split[2].article_number, "17");
    }

    #[test]
    fn test_split_without_selection_is_identity() {
        let sequencer = OrderSequencer::new();
        let list = orders();
        assert_eq!(sequencer.split_selected(&list), list);
    }

    #[test]
    fn test_toggle_unknown_order() {
        let sequencer = OrderSequencer::new();
        let mut list = orders();
        assert!(!sequencer.toggle_selection(&mut list, "99"));
        assert!(list.iter().all(|o| !o.selected));
    }

    #[test]
    fn test_move_order_respects_edges() {
        let sequencer = OrderSequencer::new();
        let mut list = orders();

        assert!(!sequencer.move_order(&mut list, 0, MoveDirection::Up));
        assert!(!sequencer.move_order(&mut list, 2, MoveDirection::Down));
        assert!(!sequencer.move_order(&mut list, 7, MoveDirection::Up));

        assert!(sequencer.move_order(&mut list, 2, MoveDirection::Up));
        let ids: Vec<_> = list.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);

        assert!(sequencer.move_order(&mut list, 0, MoveDirection::Down));
        let ids: Vec<_> = list.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_split_in_payload() {
        let sequencer = OrderSequencer::new();
        let mut list = orders();
        list[0].selected = true;
        let mut data = ProductionPlanningData { orders: Some(list) };

        sequencer.split_in_payload(&mut data);
        assert_eq!(data.orders.as_ref().map(Vec::len), Some(4));

        let mut empty = ProductionPlanningData { orders: None };
        sequencer.split_in_payload(&mut empty);
        assert!(empty.orders.is_none());
    }
}
