// ==========================================
// 菌菇加工运营系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 重复到货不是错误（稳态事件），不在此定义
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 输入形状/范围错误（如非正重量、负库存）
    #[error("数据验证失败: {0}")]
    Validation(String),

    /// 操作目标不存在
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 操作在当前数据下无意义（如装罐数为 0 无法计算毛利）
    #[error("无效操作: {0}")]
    InvalidOperation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
