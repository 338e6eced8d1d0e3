// ==========================================
// 菌菇加工运营系统 - 到货表导入
// ==========================================
// 流程: 文件解析 → 表头归一化 → 字段转换 → CandidateBatch 列表
// 表头匹配忽略大小写、空格、下划线、连字符
// 任一行转换失败则整表拒收（与云端拉取一致的全有或全无）
// ==========================================

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::delivery::{parse_received_at, CandidateBatch};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, UniversalFileParser};

/// 列归一化后的规范名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    FarmerName,
    FarmId,
    MushroomType,
    TotalWeight,
    SpoiledWeight,
    SpoilageReason,
    ReceivedAt,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "id" | "batchid" => Some(Column::Id),
            "farmername" | "farmer" => Some(Column::FarmerName),
            "farmid" => Some(Column::FarmId),
            "mushroomtype" | "type" => Some(Column::MushroomType),
            "totalweight" | "weight" => Some(Column::TotalWeight),
            "spoiledweight" | "spoiled" => Some(Column::SpoiledWeight),
            "spoilagereason" | "reason" => Some(Column::SpoilageReason),
            "receivedat" | "date" => Some(Column::ReceivedAt),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::FarmerName => "farmerName",
            Column::FarmId => "farmId",
            Column::MushroomType => "mushroomType",
            Column::TotalWeight => "totalWeight",
            Column::SpoiledWeight => "spoiledWeight",
            Column::SpoilageReason => "spoilageReason",
            Column::ReceivedAt => "receivedAt",
        }
    }
}

const REQUIRED_COLUMNS: [Column; 3] = [Column::FarmerName, Column::MushroomType, Column::TotalWeight];

// ==========================================
// DeliverySheetImporter
// ==========================================
#[derive(Debug, Default)]
pub struct DeliverySheetImporter;

impl DeliverySheetImporter {
    pub fn new() -> Self {
        Self
    }

    /// 读取到货表文件，得到候选到货
    pub fn load<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<CandidateBatch>> {
        let path = file_path.as_ref();
        let rows = UniversalFileParser.parse(path)?;
        let candidates = self.convert_rows(&rows)?;
        info!(
            file = %path.display(),
            rows = rows.len(),
            candidates = candidates.len(),
            "到货表解析完成"
        );
        Ok(candidates)
    }

    /// 原始行 → 候选到货
    pub fn convert_rows(&self, rows: &[RawRow]) -> ImportResult<Vec<CandidateBatch>> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };

        let mapping: HashMap<&str, Column> = first
            .fields
            .keys()
            .filter_map(|h| Column::from_header(h).map(|c| (h.as_str(), c)))
            .collect();
        reject_duplicate_columns(&mapping)?;
        for required in REQUIRED_COLUMNS {
            if !mapping.values().any(|c| *c == required) {
                return Err(ImportError::MissingColumn(required.name().to_string()));
            }
        }

        rows.iter().map(|row| convert_row(row, &mapping)).collect()
    }
}

/// 多个表头归一化到同一列时取值不确定，整表拒收
fn reject_duplicate_columns(mapping: &HashMap<&str, Column>) -> ImportResult<()> {
    let mut by_column: HashMap<Column, Vec<String>> = HashMap::new();
    for (header, column) in mapping {
        by_column.entry(*column).or_default().push(header.to_string());
    }
    let mut duplicates: Vec<(Column, Vec<String>)> = by_column
        .into_iter()
        .filter(|(_, headers)| headers.len() > 1)
        .collect();
    duplicates.sort_by_key(|(column, _)| column.name());

    match duplicates.into_iter().next() {
        Some((column, mut headers)) => {
            headers.sort();
            Err(ImportError::DuplicateColumn {
                column: column.name().to_string(),
                headers,
            })
        }
        None => Ok(()),
    }
}

fn convert_row(row: &RawRow, mapping: &HashMap<&str, Column>) -> ImportResult<CandidateBatch> {
    let mut candidate = CandidateBatch::default();

    for (header, value) in &row.fields {
        let Some(column) = mapping.get(header.as_str()).copied() else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        match column {
            Column::Id => candidate.id = Some(value.clone()),
            Column::FarmerName => candidate.farmer_name = Some(value.clone()),
            Column::FarmId => candidate.farm_id = Some(value.clone()),
            Column::MushroomType => candidate.mushroom_type = Some(value.clone()),
            Column::TotalWeight => candidate.total_weight = Some(parse_weight(row.row, column, value)?),
            Column::SpoiledWeight => {
                candidate.spoiled_weight = Some(parse_weight(row.row, column, value)?)
            }
            Column::SpoilageReason => candidate.spoilage_reason = Some(value.clone()),
            Column::ReceivedAt => candidate.received_at = Some(parse_date(row.row, column, value)?),
        }
    }

    debug!(row = row.row, id = ?candidate.id, "到货表行转换");
    Ok(candidate)
}

fn parse_weight(row: usize, column: Column, value: &str) -> ImportResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImportError::TypeConversionError {
            row,
            field: column.name().to_string(),
            message: format!("无法解析为数值: {}", value),
        })
}

/// 支持 RFC3339 时间戳或 YYYY-MM-DD 日期（按 UTC 零点）
fn parse_date(row: usize, column: Column, value: &str) -> ImportResult<DateTime<Utc>> {
    parse_received_at(value).ok_or_else(|| ImportError::TypeConversionError {
        row,
        field: column.name().to_string(),
        message: format!("无法解析为日期: {}", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(row: usize, pairs: &[(&str, &str)]) -> RawRow {
        RawRow {
            row,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_headers_are_normalized() {
        let rows = vec![raw(
            2,
            &[
                ("Farmer Name", "Village A"),
                ("mushroom_type", "Oyster Mushrooms"),
                ("TOTAL-WEIGHT", "50"),
                ("Spoiled Weight", "2"),
                ("ID", "B-2025-0001"),
            ],
        )];

        let candidates = DeliverySheetImporter::new().convert_rows(&rows).unwrap();

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.id.as_deref(), Some("B-2025-0001"));
        assert_eq!(c.farmer_name.as_deref(), Some("Village A"));
        assert_eq!(c.total_weight, Some(50.0));
        assert_eq!(c.spoiled_weight, Some(2.0));
    }

    #[test]
    fn test_missing_required_column() {
        let rows = vec![raw(2, &[("farmerName", "A"), ("totalWeight", "5")])];
        let err = DeliverySheetImporter::new().convert_rows(&rows).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(col) if col == "mushroomType"));
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let rows = vec![raw(
            2,
            &[
                ("farmerName", "A"),
                ("mushroomType", "Enoki"),
                ("Total Weight", "5"),
                ("weight", "7"),
            ],
        )];
        let err = DeliverySheetImporter::new().convert_rows(&rows).unwrap_err();
        match err {
            ImportError::DuplicateColumn { column, headers } => {
                assert_eq!(column, "totalWeight");
                assert_eq!(headers, vec!["Total Weight".to_string(), "weight".to_string()]);
            }
            other => panic!("Expected DuplicateColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_reports_row() {
        let rows = vec![
            raw(2, &[("farmerName", "A"), ("mushroomType", "Enoki"), ("totalWeight", "5")]),
            raw(3, &[("farmerName", "B"), ("mushroomType", "Enoki"), ("totalWeight", "heavy")]),
        ];
        let err = DeliverySheetImporter::new().convert_rows(&rows).unwrap_err();
        match err {
            ImportError::TypeConversionError { row, field, .. } => {
                assert_eq!(row, 3);
                assert_eq!(field, "totalWeight");
            }
            other => panic!("Expected TypeConversionError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_cells_stay_none() {
        let rows = vec![raw(
            2,
            &[("id", ""), ("farmerName", "A"), ("mushroomType", "Enoki"), ("totalWeight", "5")],
        )];
        let candidates = DeliverySheetImporter::new().convert_rows(&rows).unwrap();
        assert!(candidates[0].id.is_none());
        assert!(candidates[0].spoiled_weight.is_none());
    }

    #[test]
    fn test_spoilage_reason_column() {
        let rows = vec![raw(
            2,
            &[
                ("farmerName", "A"),
                ("mushroomType", "Enoki"),
                ("totalWeight", "5"),
                ("Spoiled", "0.4"),
                ("Reason", "Pest Damage"),
            ],
        )];
        let candidates = DeliverySheetImporter::new().convert_rows(&rows).unwrap();
        assert_eq!(candidates[0].spoilage_reason.as_deref(), Some("Pest Damage"));
    }

    #[test]
    fn test_received_date_parsing() {
        let rows = vec![raw(
            2,
            &[
                ("farmerName", "A"),
                ("mushroomType", "Enoki"),
                ("totalWeight", "5"),
                ("receivedAt", "2025-03-01"),
            ],
        )];
        let candidates = DeliverySheetImporter::new().convert_rows(&rows).unwrap();
        assert_eq!(
            candidates[0].received_at.unwrap().to_rfc3339(),
            "2025-03-01T00:00:00+00:00"
        );
    }
}
