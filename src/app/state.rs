// ==========================================
// 菌菇加工运营系统 - 应用状态
// ==========================================
// 职责: 进程内唯一的装配点，所有 API 共享同一个 FacilityState
// SQLite 连接在配置管理、审计仓储与账号仓储间共享
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::{
    AccessControl, AlertApi, ApiError, ApiResult, AuditTrail, DashboardApi, InventoryApi,
    PackingApi, ProcessingApi, ReceivingApi, SyncApi, UserApi,
};
use crate::config::{config_keys, ConfigManager};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::inventory::default_inventory;
use crate::engine::facility::{FacilityState, SharedFacility};
use crate::notify::{LogResetNotifier, ResetNotifier};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::user_repo::UserRepository;
use crate::sync::{CloudSyncService, HttpSyncTransport, SyncTransport};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "MUSHROOM_OPS_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 车间共享状态（批次/待验收/库存/预警）
    pub facility: SharedFacility,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,

    pub user_api: Arc<UserApi>,
    pub receiving_api: Arc<ReceivingApi>,
    pub processing_api: Arc<ProcessingApi>,
    pub packing_api: Arc<PackingApi>,
    pub inventory_api: Arc<InventoryApi>,
    pub alert_api: Arc<AlertApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub sync_api: Arc<SyncApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// 配置了 sync_endpoint 时使用 HTTP 传输，否则同步不可用
    /// 重置码仅写入日志（LogResetNotifier）
    pub fn new(db_path: String) -> ApiResult<Self> {
        Self::with_services(db_path, None, Arc::new(LogResetNotifier))
    }

    /// 使用指定的同步传输创建（测试/嵌入场景）
    pub fn with_transport(db_path: String, transport: Arc<dyn SyncTransport>) -> ApiResult<Self> {
        Self::with_services(db_path, Some(transport), Arc::new(LogResetNotifier))
    }

    /// 指定同步传输与重置码投递渠道
    pub fn with_services(
        db_path: String,
        transport: Option<Arc<dyn SyncTransport>>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> ApiResult<Self> {
        info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 基础设施
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let audit = AuditTrail::new(action_log_repo.clone());
        let user_repo = Arc::new(UserRepository::new(conn));
        let access = AccessControl::new(user_repo.clone());

        // 仅在显式配置时切换语言，未配置保持默认 zh-CN
        if let Some(locale) = config_manager.get_global_config_value(config_keys::LOCALE)? {
            crate::i18n::set_locale(locale.trim());
        }

        // ==========================================
        // 车间状态
        // ==========================================
        let facility = FacilityState::in_memory(default_inventory()).into_shared();

        // ==========================================
        // 云端同步
        // ==========================================
        let sync_settings = config_manager.get_sync_settings()?;
        let transport = match (transport, &sync_settings.endpoint) {
            (Some(t), _) => Some(t),
            (None, Some(endpoint)) => {
                let http = HttpSyncTransport::new(endpoint.as_str(), sync_settings.timeout)?;
                Some(Arc::new(http) as Arc<dyn SyncTransport>)
            }
            (None, None) => {
                warn!("未配置 sync_endpoint，云端同步不可用");
                None
            }
        };
        let sync_service = Arc::new(CloudSyncService::new(
            transport,
            sync_settings.timeout,
            facility.clone(),
        ));

        // ==========================================
        // API 层
        // ==========================================
        let user_api = Arc::new(UserApi::new(
            user_repo,
            config_manager.clone(),
            notifier,
            audit.clone(),
        ));
        let receiving_api = Arc::new(ReceivingApi::new(
            facility.clone(),
            audit.clone(),
            access.clone(),
        ));
        let processing_api = Arc::new(ProcessingApi::new(
            facility.clone(),
            audit.clone(),
            access.clone(),
        ));
        let packing_api = Arc::new(PackingApi::new(
            facility.clone(),
            audit.clone(),
            access.clone(),
            config_manager.clone(),
        ));
        let inventory_api = Arc::new(InventoryApi::new(
            facility.clone(),
            audit.clone(),
            access.clone(),
        ));
        let alert_api = Arc::new(AlertApi::new(facility.clone(), audit.clone(), access.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(facility.clone(), action_log_repo.clone()));
        let sync_api = Arc::new(SyncApi::new(sync_service, audit, access));

        info!("AppState初始化完成");
        Ok(Self {
            db_path,
            facility,
            config_manager,
            action_log_repo,
            user_api,
            receiving_api,
            processing_api,
            packing_api,
            inventory_api,
            alert_api,
            dashboard_api,
            sync_api,
        })
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 MUSHROOM_OPS_DB_PATH（非空时）
/// - 用户数据目录/mushroom-ops/mushroom_ops.db
/// - 回退: ./mushroom_ops.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let fallback = PathBuf::from("./mushroom_ops.db");
    let path = match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("mushroom-ops");
            match std::fs::create_dir_all(&dir) {
                Ok(()) => dir.join("mushroom_ops.db"),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "数据目录创建失败，使用当前目录");
                    fallback
                }
            }
        }
        None => fallback,
    };

    path.to_string_lossy().to_string()
}
