// ==========================================
// 菌菇加工运营系统 - 批次仓储
// ==========================================
// 职责: 持有全部生产批次及其生命周期状态
// 红线: 批次只追加不删除；状态只能前向推进
// 约定: list() 按创建时间倒序（最新在前），看板依赖此顺序
// ==========================================

use chrono::{Datelike, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::batch::{compute_good_weight, Batch, BatchUpdate, NewBatch};
use crate::domain::types::BatchStatus;
use crate::engine::error::{EngineError, EngineResult};

/// 生成批次号的最大尝试次数（四位随机号冲突时重试）
const MAX_ID_ATTEMPTS: usize = 32;

// ==========================================
// BatchStore Trait
// ==========================================
// 实现者: InMemoryBatchStore
// 工作流通过此接口访问批次，便于替换/测试
pub trait BatchStore: Send {
    /// 创建批次（状态 Received）
    ///
    /// # 错误
    /// - Validation: total_weight <= 0、spoiled_weight 为负、农户/品种为空、批次号已存在
    fn create(&mut self, data: NewBatch) -> EngineResult<Batch>;

    /// 推进批次状态并合并附带字段
    ///
    /// # 错误
    /// - NotFound: 批次不存在
    /// - InvalidStateTransition: 目标状态不在当前状态之后
    fn advance(&mut self, id: &str, target: BatchStatus, update: BatchUpdate)
        -> EngineResult<Batch>;

    /// 按批次号查询
    fn get(&self, id: &str) -> Option<&Batch>;

    /// 全部批次，最新在前
    fn list(&self) -> Vec<Batch>;

    /// 批次号是否已存在
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// 批次数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// InMemoryBatchStore - 内存批次仓储
// ==========================================
#[derive(Debug, Default)]
pub struct InMemoryBatchStore {
    // 插入顺序（最旧在前）
    batches: Vec<Batch>,
    // 批次号 → 下标
    index: HashMap<String, usize>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成 `B-<年>-<四位号>` 格式的唯一批次号
    fn generate_id(&self) -> String {
        let year = Utc::now().year();
        for _ in 0..MAX_ID_ATTEMPTS {
            let serial = 1000 + (uuid::Uuid::new_v4().as_u128() % 9000) as u32;
            let candidate = format!("B-{}-{}", year, serial);
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
        // 四位号空间耗尽时退化为 UUID 后缀
        format!("B-{}-{}", year, uuid::Uuid::new_v4().simple())
    }

    fn validate(data: &NewBatch) -> EngineResult<()> {
        if !data.total_weight.is_finite() || data.total_weight <= 0.0 {
            return Err(EngineError::Validation(format!(
                "总重量必须大于 0: {}",
                data.total_weight
            )));
        }
        if !data.spoiled_weight.is_finite() || data.spoiled_weight < 0.0 {
            return Err(EngineError::Validation(format!(
                "损耗重量不能为负: {}",
                data.spoiled_weight
            )));
        }
        if data.farmer_name.trim().is_empty() {
            return Err(EngineError::Validation("农户名称不能为空".to_string()));
        }
        if data.mushroom_type.trim().is_empty() {
            return Err(EngineError::Validation("菌菇品种不能为空".to_string()));
        }
        Ok(())
    }
}

impl BatchStore for InMemoryBatchStore {
    fn create(&mut self, data: NewBatch) -> EngineResult<Batch> {
        Self::validate(&data)?;

        let requested_id = data
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let id = match requested_id {
            Some(id) if self.index.contains_key(&id) => {
                return Err(EngineError::Validation(format!("批次号已存在: {}", id)));
            }
            Some(id) => id,
            None => self.generate_id(),
        };

        let batch = Batch {
            id: id.clone(),
            farmer_name: data.farmer_name.trim().to_string(),
            farm_id: data.farm_id.trim().to_string(),
            received_at: data.received_at.unwrap_or_else(Utc::now),
            mushroom_type: data.mushroom_type.trim().to_string(),
            total_weight: data.total_weight,
            spoiled_weight: data.spoiled_weight,
            good_weight: compute_good_weight(data.total_weight, data.spoiled_weight),
            spoilage_reason: data
                .spoilage_reason
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            status: BatchStatus::Received,
            recipe: None,
            wash_time: None,
            water_usage: None,
            drying_time: None,
            qc_status: None,
            qc_notes: None,
            packed_tins: None,
            qr_code: None,
            cost: None,
            estimated_revenue: None,
            margin: None,
        };

        self.index.insert(id.clone(), self.batches.len());
        self.batches.push(batch.clone());

        info!(
            batch_id = %id,
            farmer = %batch.farmer_name,
            good_weight = batch.good_weight,
            "批次已创建"
        );
        Ok(batch)
    }

    fn advance(
        &mut self,
        id: &str,
        target: BatchStatus,
        update: BatchUpdate,
    ) -> EngineResult<Batch> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| EngineError::not_found("Batch", id))?;
        let batch = &mut self.batches[idx];

        if !batch.status.can_advance_to(target) {
            return Err(EngineError::InvalidStateTransition {
                from: batch.status.to_string(),
                to: target.to_string(),
            });
        }

        debug!(batch_id = %id, from = %batch.status, to = %target, "批次状态推进");
        batch.status = target;
        batch.apply_update(update);

        info!(batch_id = %id, status = %target, "批次状态已更新");
        Ok(batch.clone())
    }

    fn get(&self, id: &str) -> Option<&Batch> {
        self.index.get(id).map(|&idx| &self.batches[idx])
    }

    fn list(&self) -> Vec<Batch> {
        self.batches.iter().rev().cloned().collect()
    }

    fn len(&self) -> usize {
        self.batches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::QcResult;

    fn new_batch(farmer: &str, total: f64, spoiled: f64) -> NewBatch {
        NewBatch {
            farmer_name: farmer.to_string(),
            farm_id: "Farm #04".to_string(),
            mushroom_type: "Oyster Mushrooms".to_string(),
            total_weight: total,
            spoiled_weight: spoiled,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_computes_good_weight_and_status() {
        let mut store = InMemoryBatchStore::new();
        let batch = store.create(new_batch("Village A", 50.0, 2.0)).unwrap();

        assert_eq!(batch.good_weight, 48.0);
        assert_eq!(batch.status, BatchStatus::Received);
        assert!(batch.id.starts_with("B-"));
        assert!(store.contains(&batch.id));
    }

    #[test]
    fn test_create_keeps_trimmed_spoilage_reason() {
        let mut store = InMemoryBatchStore::new();
        let with_reason = store
            .create(NewBatch {
                spoilage_reason: Some("  Mold / Bruising ".to_string()),
                ..new_batch("Village A", 50.0, 2.0)
            })
            .unwrap();
        let blank = store
            .create(NewBatch {
                spoilage_reason: Some("   ".to_string()),
                ..new_batch("Village B", 20.0, 0.0)
            })
            .unwrap();

        assert_eq!(with_reason.spoilage_reason.as_deref(), Some("Mold / Bruising"));
        assert_eq!(blank.spoilage_reason, None);
        assert!(store.create(new_batch("Village C", 5.0, 0.0)).unwrap().spoilage_reason.is_none());
    }

    #[test]
    fn test_create_clamps_good_weight() {
        let mut store = InMemoryBatchStore::new();
        let batch = store.create(new_batch("Village A", 5.0, 9.0)).unwrap();
        assert_eq!(batch.good_weight, 0.0);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let mut store = InMemoryBatchStore::new();

        assert!(matches!(
            store.create(new_batch("Village A", 0.0, 0.0)),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            store.create(new_batch("Village A", -3.0, 0.0)),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            store.create(new_batch("   ", 10.0, 0.0)),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            store.create(new_batch("Village A", 10.0, -1.0)),
            Err(EngineError::Validation(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_with_explicit_id_must_be_unique() {
        let mut store = InMemoryBatchStore::new();
        let mut data = new_batch("Village A", 10.0, 0.0);
        data.id = Some(" B-1 ".to_string());

        let first = store.create(data.clone()).unwrap();
        assert_eq!(first.id, "B-1");

        assert!(matches!(store.create(data), Err(EngineError::Validation(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let mut store = InMemoryBatchStore::new();
        let a = store.create(new_batch("A", 10.0, 0.0)).unwrap();
        let b = store.create(new_batch("B", 10.0, 0.0)).unwrap();
        let c = store.create(new_batch("C", 10.0, 0.0)).unwrap();

        let ids: Vec<String> = store.list().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_advance_unknown_id_is_not_found() {
        let mut store = InMemoryBatchStore::new();
        let result = store.advance("B-404", BatchStatus::Washing, BatchUpdate::default());
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_advance_rejects_backward_transition() {
        let mut store = InMemoryBatchStore::new();
        let batch = store.create(new_batch("A", 10.0, 0.0)).unwrap();
        store
            .advance(&batch.id, BatchStatus::Drying, BatchUpdate::default())
            .unwrap();

        let result = store.advance(&batch.id, BatchStatus::Washing, BatchUpdate::default());
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition { .. })
        ));
        assert_eq!(store.get(&batch.id).unwrap().status, BatchStatus::Drying);
    }

    #[test]
    fn test_advance_merges_fields() {
        let mut store = InMemoryBatchStore::new();
        let batch = store.create(new_batch("A", 10.0, 0.0)).unwrap();
        store
            .advance(
                &batch.id,
                BatchStatus::Washing,
                BatchUpdate {
                    recipe: Some("Spicy Chips".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let failed = store
            .advance(
                &batch.id,
                BatchStatus::Completed,
                BatchUpdate {
                    qc_status: Some(QcResult::Fail),
                    ..Default::default()
                },
            )
            .unwrap();

        // 之前合并的字段保留
        assert_eq!(failed.recipe.as_deref(), Some("Spicy Chips"));
        assert_eq!(failed.qc_status, Some(QcResult::Fail));
        assert_eq!(failed.status, BatchStatus::Completed);
    }
}
