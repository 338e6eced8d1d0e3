// ==========================================
// 菌菇加工运营系统 - 到货对账器
// ==========================================
// 职责: 将外部上报的候选批次合并进待验收队列，不重复已知/已排队的到货
// 红线: merge/accept 为纯函数，不发预警、不改外部状态
//       预警由调用方根据合并结果（新增部分）另行发出
// ==========================================
// 去重规则（按输入顺序逐条判定，命中即短路）:
// 1. 批次号命中: 非空 id 与已有批次 / 原队列 / 本次已接纳项完全相等（区分大小写）
// 2. 内容命中: 原队列中存在农户 + 品种 + 总重完全一致的到货
// 3. 否则接纳，追加到队尾
// ==========================================

use std::collections::HashSet;
use tracing::debug;

use crate::domain::batch::Batch;
use crate::domain::delivery::{CandidateBatch, DeliveryRef, PendingDelivery};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// MergeOutcome - 合并结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// 新队列 = 原队列 + 新接纳项（按到达顺序）
    pub queue: Vec<PendingDelivery>,
    /// 原队列长度（queue[previous_len..] 即本次新增）
    pub previous_len: usize,
    /// 被判定为重复而丢弃的候选数
    pub duplicates: usize,
}

impl MergeOutcome {
    /// 本次新接纳的到货
    pub fn admitted(&self) -> &[PendingDelivery] {
        &self.queue[self.previous_len..]
    }

    pub fn admitted_count(&self) -> usize {
        self.queue.len() - self.previous_len
    }
}

// 判定理由（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuplicateReason {
    KnownBatch,
    QueuedId,
    SameContent,
}

/// 合并候选批次到待验收队列
///
/// # 参数
/// - candidates: 外部候选记录（按输入顺序判定）
/// - existing_batches: 批次仓储中的已有批次
/// - pending: 当前待验收队列
///
/// # 返回
/// - MergeOutcome: 完整的新队列（调用方整体替换旧队列）
pub fn merge(
    candidates: &[CandidateBatch],
    existing_batches: &[Batch],
    pending: &[PendingDelivery],
) -> MergeOutcome {
    let known_batch_ids: HashSet<&str> = existing_batches.iter().map(|b| b.id.as_str()).collect();
    let mut queued_ids: HashSet<String> = pending.iter().filter_map(|p| p.id.clone()).collect();

    let mut queue: Vec<PendingDelivery> = pending.to_vec();
    let mut duplicates = 0;

    for candidate in candidates {
        let delivery = PendingDelivery::from_candidate(candidate);

        let reason = match delivery.id.as_deref() {
            Some(id) if known_batch_ids.contains(id) => Some(DuplicateReason::KnownBatch),
            Some(id) if queued_ids.contains(id) => Some(DuplicateReason::QueuedId),
            _ => pending
                .iter()
                .any(|p| p.same_content_as(&delivery))
                .then_some(DuplicateReason::SameContent),
        };

        if let Some(reason) = reason {
            debug!(
                candidate_id = ?delivery.id,
                farmer = ?delivery.farmer_name,
                reason = ?reason,
                "候选到货判定为重复，已丢弃"
            );
            duplicates += 1;
            continue;
        }

        if let Some(id) = &delivery.id {
            queued_ids.insert(id.clone());
        }
        queue.push(delivery);
    }

    MergeOutcome {
        queue,
        previous_len: pending.len(),
        duplicates,
    }
}

/// 从队列中取出指定到货
///
/// # 返回
/// - (取出的到货, 剩余队列)
///
/// # 错误
/// - NotFound: 队列中没有匹配的到货
pub fn accept(
    queue: &[PendingDelivery],
    target: &DeliveryRef,
) -> EngineResult<(PendingDelivery, Vec<PendingDelivery>)> {
    let position = match target {
        DeliveryRef::Id(id) => {
            let id = id.trim();
            queue
                .iter()
                .position(|p| p.id.as_deref() == Some(id))
        }
        DeliveryRef::Position(pos) => (*pos < queue.len()).then_some(*pos),
    }
    .ok_or_else(|| EngineError::not_found("PendingDelivery", target.to_string()))?;

    let mut remainder = queue.to_vec();
    let taken = remainder.remove(position);
    Ok((taken, remainder))
}

// ==========================================
// DeliveryQueue - 待验收队列
// ==========================================
// 队首为最早未处理的到货；只能整体替换（先算完再交换）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryQueue {
    items: Vec<PendingDelivery>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PendingDelivery] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 用新计算的队列整体替换
    pub fn replace(&mut self, items: Vec<PendingDelivery>) {
        self.items = items;
    }
}
