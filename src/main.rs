// ==========================================
// 菌菇加工运营系统 - 命令行入口
// ==========================================
// 每次调用装配一个新的 AppState（内存车间状态 + SQLite 配置/审计/账号）
// 单次命令的车间状态随进程结束而丢失，连续作业使用 shell 会话
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use mushroom_ops::api::SyncApi;
use mushroom_ops::app::{get_default_db_path, AppState};
use mushroom_ops::config::config_keys;
use mushroom_ops::domain::{NewUser, Role, User};
use mushroom_ops::i18n::{t, t_with_args};
use mushroom_ops::shell::{describe_error, run_shell};

/// 菌菇加工运营系统命令行工具
#[derive(Parser, Debug)]
#[command(name = "mushroom-ops", version, about, long_about = None)]
struct Cli {
    /// 数据库路径（默认读取 MUSHROOM_OPS_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_log: bool,

    /// 操作员登录名（写操作需要，口令从终端读取）
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 交互式会话（车间状态在命令之间保留）
    Shell,
    /// 运营汇总
    Summary,
    /// 推送批次与库存到云端
    Push,
    /// 从云端拉取到货
    Pull,
    /// 导入到货表 (CSV/Excel)
    Import {
        /// 文件路径
        file: PathBuf,
    },
    /// 操作员账号
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum UserAction {
    /// 注册操作员
    Register {
        id: String,
        name: String,
        email: String,
        /// Processing Worker / Packing Staff / Finance Clerk / Processing Manager
        role: Role,
    },
    /// 列出操作员
    List,
    /// 修改口令（需 --user）
    Passwd,
    /// 申请重置码（发送到注册邮箱）
    Forgot { email: String },
    /// 以重置码设置新口令
    Reset { code: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 读取配置值
    Get { key: String },
    /// 写入配置值
    Set { key: String, value: String },
    /// 列出全部配置
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_log {
        mushroom_ops::logging::init_json();
    } else {
        mushroom_ops::logging::init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", t("common.failed"), describe_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = mushroom_ops::VERSION, "{}", mushroom_ops::APP_NAME);

    let app = AppState::new(db_path)?;
    let user = cli.user;

    match cli.command {
        Commands::Shell => run_shell(app).await?,
        Commands::Summary => {
            let summary = app.dashboard_api.summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Push => {
            if app.receiving_api.list_batches()?.is_empty() {
                bail!("本进程没有批次，空快照会覆盖云端数据；请在 shell 会话中建批后推送");
            }
            let actor = login(&app, user.as_deref())?;
            let report = app.sync_api.push(&actor.id).await?;
            println!("{}", SyncApi::push_message(&report));
        }
        Commands::Pull => {
            let actor = login(&app, user.as_deref())?;
            let report = app.sync_api.pull(&actor.id).await?;
            println!(
                "received={} admitted={} duplicates={} pending={}",
                report.received, report.admitted, report.duplicates, report.queue_len
            );
        }
        Commands::Import { file } => {
            let actor = login(&app, user.as_deref())?;
            let report = app
                .receiving_api
                .import_delivery_sheet(&file, &actor.id)
                .map_err(anyhow::Error::from)
                .with_context(|| format!("导入 {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::User { action } => match action {
            UserAction::Register {
                id,
                name,
                email,
                role,
            } => {
                let password = read_new_password()?;
                let created = app.user_api.register(NewUser {
                    id,
                    name,
                    email,
                    role,
                    password,
                })?;
                println!("{}", serde_json::to_string_pretty(&created)?);
            }
            UserAction::List => {
                for u in app.user_api.list_users()? {
                    println!("{}  {}  {}  [{}]", u.id, u.name, u.email, u.role);
                }
            }
            UserAction::Passwd => {
                let id = user.context("请用 --user 指定登录名")?;
                let old = rpassword::prompt_password("当前口令: ")?;
                let new = read_new_password()?;
                app.user_api.change_password(&id, &old, &new)?;
                println!("{}", t("common.success"));
            }
            UserAction::Forgot { email } => {
                app.user_api.request_password_reset(&email)?;
                println!("{}", t_with_args("auth.reset_sent", &[("email", email.trim())]));
            }
            UserAction::Reset { code } => {
                let new = read_new_password()?;
                app.user_api.reset_password(&code, &new)?;
                println!("{}", t("common.success"));
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                let value = if key == config_keys::LOCALE {
                    Some(app.config_manager.get_locale()?)
                } else {
                    app.config_manager.get_global_config_value(&key)?
                };
                match value {
                    Some(v) => println!("{}", v),
                    None => println!("(未设置)"),
                }
            }
            ConfigAction::Set { key, value } => {
                app.config_manager.set_global_config_value(&key, &value)?;
                println!("{}", t("common.success"));
            }
            ConfigAction::List => {
                for (key, value) in app.config_manager.get_config_snapshot()? {
                    println!("{} = {}", key, value);
                }
            }
        },
    }

    Ok(())
}

/// 以 --user 指定的操作员登录
fn login(app: &AppState, user: Option<&str>) -> anyhow::Result<User> {
    let id = user.context("写操作需要 --user <登录名>")?;
    let password = rpassword::prompt_password("口令: ")?;
    Ok(app.user_api.login(id, &password)?)
}

fn read_new_password() -> anyhow::Result<String> {
    let password = rpassword::prompt_password("新口令: ")?;
    if rpassword::prompt_password("确认新口令: ")? != password {
        bail!("两次输入的口令不一致");
    }
    Ok(password)
}
