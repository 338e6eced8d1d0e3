// ==========================================
// 菌菇加工运营系统 - 云端交换报文
// ==========================================
// POST {batches, inventory, action: "push"} → {message}
// GET → {batches?, newHarvest?}
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::batch::Batch;
use crate::domain::delivery::CandidateBatch;
use crate::domain::inventory::InventorySnapshot;

/// 推送动作标识
pub const PUSH_ACTION: &str = "push";

#[derive(Debug, Clone, Serialize)]
pub struct PushRequest {
    pub batches: Vec<Batch>,
    pub inventory: Vec<InventorySnapshot>,
    pub action: &'static str,
}

impl PushRequest {
    pub fn new(batches: Vec<Batch>, inventory: Vec<InventorySnapshot>) -> Self {
        Self {
            batches,
            inventory,
            action: PUSH_ACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    #[serde(default)]
    pub batches: Option<Vec<CandidateBatch>>,
    #[serde(default)]
    pub new_harvest: Option<CandidateBatch>,
}

impl PullResponse {
    /// 合并为一个候选列表: batches 在前，newHarvest 在后
    pub fn into_candidates(self) -> Vec<CandidateBatch> {
        let mut candidates = self.batches.unwrap_or_default();
        if let Some(harvest) = self.new_harvest {
            candidates.push(harvest);
        }
        candidates
    }
}
