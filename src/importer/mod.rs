// ==========================================
// 菌菇加工运营系统 - 导入层
// ==========================================
// 职责: 离线到货表 (CSV/Excel) → 候选到货
// 去重交由到货对账，与云端拉取走同一路径
// ==========================================

pub mod delivery_sheet;
pub mod error;
pub mod file_parser;

pub use delivery_sheet::DeliverySheetImporter;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
