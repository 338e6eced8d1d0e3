// ==========================================
// 菌菇加工运营系统 - 到货领域模型
// ==========================================
// CandidateBatch: 外部（云端表格/到货表）上报的原始记录，字段全部可缺失
// PendingDelivery: 通过去重后进入待验收队列的到货，字段显式可选
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// CandidateBatch - 外部上报的候选批次
// ==========================================
// 表格数据类型不稳定：数值可能是字符串，批次号可能是数字
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub farmer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub farm_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mushroom_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub spoiled_weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub spoilage_reason: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub received_at: Option<DateTime<Utc>>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// 到货时间：RFC3339 时间戳或 YYYY-MM-DD 日期（按 UTC 零点），其余视为缺失
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => parse_received_at(&s),
        _ => None,
    })
}

/// 解析到货时间文本
pub fn parse_received_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ==========================================
// PendingDelivery - 待验收到货
// ==========================================
// 标识启发式使用: id / farmer_name / mushroom_type / total_weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDelivery {
    /// 外部批次号（已 trim，空白视为 None）
    pub id: Option<String>,
    pub farmer_name: Option<String>,
    pub farm_id: Option<String>,
    pub mushroom_type: Option<String>,
    pub total_weight: Option<f64>,
    pub spoiled_weight: Option<f64>,
    pub spoilage_reason: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

fn normalize_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl PendingDelivery {
    /// 由候选记录构造（文本字段 trim，空白 → None）
    pub fn from_candidate(candidate: &CandidateBatch) -> Self {
        Self {
            id: normalize_text(&candidate.id),
            farmer_name: normalize_text(&candidate.farmer_name),
            farm_id: normalize_text(&candidate.farm_id),
            mushroom_type: normalize_text(&candidate.mushroom_type),
            total_weight: candidate.total_weight,
            spoiled_weight: candidate.spoiled_weight,
            spoilage_reason: normalize_text(&candidate.spoilage_reason),
            received_at: candidate.received_at,
        }
    }

    /// 内容指纹是否相同（农户 + 品种 + 总重完全一致）
    ///
    /// 任一侧缺失三者之一则不构成内容重复
    pub fn same_content_as(&self, other: &PendingDelivery) -> bool {
        match (
            (&self.farmer_name, &self.mushroom_type, self.total_weight),
            (&other.farmer_name, &other.mushroom_type, other.total_weight),
        ) {
            ((Some(f1), Some(t1), Some(w1)), (Some(f2), Some(t2), Some(w2))) => {
                f1 == f2 && t1 == t2 && w1 == w2
            }
            _ => false,
        }
    }
}

// ==========================================
// DeliveryRef - 定位队列中的到货
// ==========================================
// 无批次号的到货只能按位置定位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryRef {
    Id(String),
    Position(usize),
}

impl std::fmt::Display for DeliveryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryRef::Id(id) => write!(f, "{}", id),
            DeliveryRef::Position(pos) => write!(f, "#{}", pos),
        }
    }
}
