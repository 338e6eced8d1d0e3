// ==========================================
// 菌菇加工运营系统 - 操作员与角色
// ==========================================
// 角色 → 权限范围 → 可操作的工作区
// Processing Manager: 全部；Finance Clerk: 仅看板（只读）
// Packing Staff: 包装台；Processing Worker: 收货与加工
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Role - 角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Processing Worker")]
    ProcessingWorker,
    #[serde(rename = "Packing Staff")]
    PackingStaff,
    #[serde(rename = "Finance Clerk")]
    FinanceClerk,
    #[serde(rename = "Processing Manager", alias = "Manager")]
    ProcessingManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::ProcessingWorker,
        Role::PackingStaff,
        Role::FinanceClerk,
        Role::ProcessingManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ProcessingWorker => "Processing Worker",
            Role::PackingStaff => "Packing Staff",
            Role::FinanceClerk => "Finance Clerk",
            Role::ProcessingManager => "Processing Manager",
        }
    }

    pub fn scope(&self) -> AccessScope {
        match self {
            Role::ProcessingWorker => AccessScope::ReceivingProcessing,
            Role::PackingStaff => AccessScope::PackingStation,
            Role::FinanceClerk => AccessScope::DashboardOnly,
            Role::ProcessingManager => AccessScope::FullAdmin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// 忽略大小写与空白；"Manager" 视为 Processing Manager
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "processingworker" | "worker" => Ok(Role::ProcessingWorker),
            "packingstaff" | "packer" => Ok(Role::PackingStaff),
            "financeclerk" | "finance" => Ok(Role::FinanceClerk),
            "processingmanager" | "manager" => Ok(Role::ProcessingManager),
            _ => Err(format!("未知角色: {}", s)),
        }
    }
}

// ==========================================
// AccessScope - 权限范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    FullAdmin,
    DashboardOnly,
    PackingStation,
    ReceivingProcessing,
}

impl AccessScope {
    /// 是否允许在该工作区执行写操作
    pub fn allows(&self, area: WorkArea) -> bool {
        match self {
            AccessScope::FullAdmin => true,
            AccessScope::DashboardOnly => false,
            AccessScope::PackingStation => matches!(area, WorkArea::Packing | WorkArea::Alerts),
            AccessScope::ReceivingProcessing => matches!(
                area,
                WorkArea::Receiving | WorkArea::Processing | WorkArea::Alerts
            ),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessScope::FullAdmin => "Full Admin",
            AccessScope::DashboardOnly => "Dashboard Only",
            AccessScope::PackingStation => "Packing Station",
            AccessScope::ReceivingProcessing => "Receiving & Processing",
        }
    }
}

// ==========================================
// WorkArea - 工作区（写操作归属）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkArea {
    Receiving,
    Processing,
    Packing,
    Inventory,
    Alerts,
    Sync,
}

impl WorkArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkArea::Receiving => "Receiving",
            WorkArea::Processing => "Processing",
            WorkArea::Packing => "Packing",
            WorkArea::Inventory => "Inventory",
            WorkArea::Alerts => "Alerts",
            WorkArea::Sync => "Sync",
        }
    }
}

impl fmt::Display for WorkArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// User - 操作员（不含口令）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String, // 登录名，也是操作日志里的 actor
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// 注册输入
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_scopes() {
        assert!(Role::ProcessingManager.scope().allows(WorkArea::Sync));
        assert!(Role::ProcessingWorker.scope().allows(WorkArea::Receiving));
        assert!(!Role::ProcessingWorker.scope().allows(WorkArea::Packing));
        assert!(Role::PackingStaff.scope().allows(WorkArea::Packing));
        assert!(!Role::PackingStaff.scope().allows(WorkArea::Inventory));
        for area in [WorkArea::Receiving, WorkArea::Alerts, WorkArea::Sync] {
            assert!(!Role::FinanceClerk.scope().allows(area));
        }
    }

    #[test]
    fn test_role_parsing_accepts_manager_alias() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::ProcessingManager);
        assert_eq!("packing staff".parse::<Role>().unwrap(), Role::PackingStaff);
        assert!("janitor".parse::<Role>().is_err());

        let role: Role = serde_json::from_str("\"Manager\"").unwrap();
        assert_eq!(role, Role::ProcessingManager);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"Processing Manager\"");
    }
}
