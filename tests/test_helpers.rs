// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、AppState 装配、脚本化同步传输、测试数据构造
// ==========================================
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mushroom_ops::app::AppState;
use mushroom_ops::config::ConfigManager;
use mushroom_ops::domain::{CandidateBatch, NewBatch, NewUser, Role};
use mushroom_ops::sync::{PullResponse, PushRequest, PushResponse, SyncError, SyncResult, SyncTransport};
use tempfile::TempDir;

/// 创建临时数据库目录
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> (TempDir, String) {
    mushroom_ops::logging::init_test();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("mushroom_ops.db").to_string_lossy().to_string();
    (dir, db_path)
}

/// 测试账号统一口令
pub const TEST_PASSWORD: &str = "secret-pass";

/// 测试用操作员 (登录名, 角色)
pub const TEST_USERS: [(&str, Role); 8] = [
    ("operator", Role::ProcessingManager),
    ("op", Role::ProcessingManager),
    ("supervisor", Role::ProcessingManager),
    ("store", Role::ProcessingManager),
    ("clerk", Role::ProcessingWorker),
    ("qc", Role::ProcessingWorker),
    ("packer", Role::PackingStaff),
    ("finance", Role::FinanceClerk),
];

/// 注册测试操作员
pub fn seed_users(app: &AppState) {
    for (id, role) in TEST_USERS {
        app.user_api
            .register(NewUser {
                id: id.to_string(),
                name: format!("Test {}", id),
                email: format!("{}@gmail.com", id),
                role,
                password: TEST_PASSWORD.to_string(),
            })
            .expect("Failed to register test user");
    }
}

/// 创建未配置同步的 AppState（已注册测试操作员）
pub fn create_app() -> (TempDir, AppState) {
    let (dir, db_path) = create_test_db();
    let app = AppState::new(db_path).expect("Failed to create AppState");
    seed_users(&app);
    (dir, app)
}

/// 创建使用指定同步传输的 AppState（已注册测试操作员）
pub fn create_app_with_transport(transport: Arc<dyn SyncTransport>) -> (TempDir, AppState) {
    let (dir, db_path) = create_test_db();
    let app = AppState::with_transport(db_path, transport).expect("Failed to create AppState");
    seed_users(&app);
    (dir, app)
}

/// 在 AppState 创建前写入配置
pub fn set_config(db_path: &str, key: &str, value: &str) {
    let cfg = ConfigManager::new(db_path).expect("Failed to open config");
    cfg.set_global_config_value(key, value)
        .expect("Failed to set config");
}

/// 收货建批输入
pub fn new_batch(farmer: &str, kind: &str, total: f64, spoiled: f64) -> NewBatch {
    NewBatch {
        farmer_name: farmer.to_string(),
        farm_id: format!("F-{}", farmer.len()),
        mushroom_type: kind.to_string(),
        total_weight: total,
        spoiled_weight: spoiled,
        ..Default::default()
    }
}

/// 外部候选到货
pub fn candidate(id: Option<&str>, farmer: &str, kind: &str, weight: f64) -> CandidateBatch {
    CandidateBatch {
        id: id.map(str::to_string),
        farmer_name: Some(farmer.to_string()),
        mushroom_type: Some(kind.to_string()),
        total_weight: Some(weight),
        spoiled_weight: Some(0.5),
        ..Default::default()
    }
}

/// 写入临时 CSV 文件
pub fn write_csv(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create csv");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to write csv");
    }
    path
}

// ==========================================
// ScriptedTransport - 脚本化同步传输
// ==========================================
// pull 按顺序返回预设响应；队列耗尽后返回网络错误
pub struct ScriptedTransport {
    delay: Duration,
    pulls: Mutex<VecDeque<SyncResult<PullResponse>>>,
    pushed: Mutex<Vec<PushRequest>>,
    pub push_calls: AtomicUsize,
    pub pull_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pulls: Mutex::new(VecDeque::new()),
            pushed: Mutex::new(Vec::new()),
            push_calls: AtomicUsize::new(0),
            pull_calls: AtomicUsize::new(0),
        }
    }

    /// 追加一次成功的拉取响应
    pub fn respond_with(self, batches: Vec<CandidateBatch>, new_harvest: Option<CandidateBatch>) -> Self {
        self.pulls.lock().unwrap().push_back(Ok(PullResponse {
            batches: Some(batches),
            new_harvest,
        }));
        self
    }

    /// 追加一次失败的拉取
    pub fn fail_with(self, err: SyncError) -> Self {
        self.pulls.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn last_push(&self) -> Option<PushRequest> {
        self.pushed.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SyncTransport for ScriptedTransport {
    async fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.pushed.lock().unwrap().push(request.clone());
        Ok(PushResponse {
            message: format!("{} batches saved", request.batches.len()),
        })
    }

    async fn pull(&self) -> SyncResult<PullResponse> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.pulls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Network("no scripted response".to_string())))
    }
}
