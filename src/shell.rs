// ==========================================
// 菌菇加工运营系统 - 交互式会话
// ==========================================
// 一个会话持有一个 AppState，车间状态在命令之间保留
// 写操作以当前登录的操作员身份执行
// ==========================================

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};

use crate::api::{ApiError, SyncApi};
use crate::app::AppState;
use crate::domain::{DeliveryRef, NewBatch, User};
use crate::i18n::t;

const HELP: &str = "\
命令:
  login <登录名>                          登录（口令不回显）
  logout | whoami
  passwd                                  修改口令
  summary | batches | pending | inventory | alerts | users
  receive <农户> <菇种> <总重kg> <损耗kg>  收货建批（含空格的参数用双引号）
  accept <批次号|#序号>                   验收待验收到货
  discard <批次号|#序号>                  丢弃待验收到货
  import <文件>                           导入到货表 (CSV/Excel)
  push | pull                             云端同步
  help | /quit";

/// 口令读取（交互式会话中为不回显的终端输入）
pub type PasswordReader = Box<dyn Fn(&str) -> std::io::Result<String> + Send>;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Login(String),
    Logout,
    Whoami,
    Passwd,
    Summary,
    Batches,
    Pending,
    Inventory,
    Alerts,
    Users,
    Receive {
        farmer: String,
        mushroom_type: String,
        total: f64,
        spoiled: f64,
    },
    Accept(DeliveryRef),
    Discard(DeliveryRef),
    Import(PathBuf),
    Push,
    Pull,
    Quit,
}

/// 单条命令的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Output(String),
    Quit,
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let args = split_args(line)?;
    let Some((name, rest)) = args.split_first() else {
        return Err("空命令".to_string());
    };

    let arity = |n: usize| -> Result<(), String> {
        if rest.len() == n {
            Ok(())
        } else {
            Err(format!("{} 需要 {} 个参数，收到 {} 个", name, n, rest.len()))
        }
    };

    let command = match name.trim_start_matches('/').to_lowercase().as_str() {
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "login" => {
            arity(1)?;
            ShellCommand::Login(rest[0].clone())
        }
        "logout" => ShellCommand::Logout,
        "whoami" => ShellCommand::Whoami,
        "passwd" => ShellCommand::Passwd,
        "summary" => ShellCommand::Summary,
        "batches" => ShellCommand::Batches,
        "pending" => ShellCommand::Pending,
        "inventory" => ShellCommand::Inventory,
        "alerts" => ShellCommand::Alerts,
        "users" => ShellCommand::Users,
        "receive" => {
            arity(4)?;
            ShellCommand::Receive {
                farmer: rest[0].clone(),
                mushroom_type: rest[1].clone(),
                total: parse_weight(&rest[2])?,
                spoiled: parse_weight(&rest[3])?,
            }
        }
        "accept" => {
            arity(1)?;
            ShellCommand::Accept(parse_delivery_ref(&rest[0])?)
        }
        "discard" => {
            arity(1)?;
            ShellCommand::Discard(parse_delivery_ref(&rest[0])?)
        }
        "import" => {
            arity(1)?;
            ShellCommand::Import(PathBuf::from(&rest[0]))
        }
        "push" => ShellCommand::Push,
        "pull" => ShellCommand::Pull,
        other => return Err(format!("未知命令: {}（输入 help 查看）", other)),
    };
    Ok(command)
}

/// 按空白切分，双引号内的空白保留
fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err("引号未闭合".to_string());
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

fn parse_weight(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("重量格式错误: {}", value))
}

/// "#2" 按队列位置（从 0 起），其余按批次号
fn parse_delivery_ref(value: &str) -> Result<DeliveryRef, String> {
    match value.strip_prefix('#') {
        Some(pos) => pos
            .parse::<usize>()
            .map(DeliveryRef::Position)
            .map_err(|_| format!("序号格式错误: {}", value)),
        None => Ok(DeliveryRef::Id(value.to_string())),
    }
}

/// 错误的用户可读描述（ApiError 走本地化文案）
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api_err) => api_err.user_message(),
        None => format!("{:#}", err),
    }
}

// ==========================================
// ShellSession - 会话状态
// ==========================================
pub struct ShellSession {
    app: AppState,
    user: Option<User>,
    read_password: PasswordReader,
}

impl ShellSession {
    pub fn new(app: AppState, read_password: PasswordReader) -> Self {
        Self {
            app,
            user: None,
            read_password,
        }
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn prompt(&self) -> String {
        match &self.user {
            Some(user) => format!("mushroom-ops({})> ", user.id),
            None => "mushroom-ops> ".to_string(),
        }
    }

    fn actor(&self) -> anyhow::Result<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .ok_or_else(|| anyhow!("请先登录: login <登录名>"))
    }

    fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        (self.read_password)(prompt).context("读取口令失败")
    }

    pub async fn execute(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        let output = match command {
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Login(id) => {
                let password = self.ask("口令: ")?;
                let user = self.app.user_api.login(&id, &password)?;
                let line = format!("已登录: {} [{}]", user.name, user.role);
                self.user = Some(user);
                line
            }
            ShellCommand::Logout => match self.user.take() {
                Some(user) => format!("已退出: {}", user.id),
                None => "未登录".to_string(),
            },
            ShellCommand::Whoami => match &self.user {
                Some(user) => format!(
                    "{} ({}) [{} / {}]",
                    user.id,
                    user.email,
                    user.role,
                    user.role.scope().label()
                ),
                None => "未登录".to_string(),
            },
            ShellCommand::Passwd => {
                let actor = self.actor()?.to_string();
                let old = self.ask("当前口令: ")?;
                let new = self.ask("新口令: ")?;
                if self.ask("确认新口令: ")? != new {
                    bail!("两次输入的新口令不一致");
                }
                self.app.user_api.change_password(&actor, &old, &new)?;
                t("common.success")
            }
            ShellCommand::Summary => serde_json::to_string_pretty(&self.app.dashboard_api.summary()?)?,
            ShellCommand::Batches => self
                .app
                .receiving_api
                .list_batches()?
                .iter()
                .map(|b| {
                    format!(
                        "{}  {}  {} / {}  {:.1}kg",
                        b.id, b.status, b.farmer_name, b.mushroom_type, b.total_weight
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ShellCommand::Pending => self
                .app
                .receiving_api
                .list_pending()?
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    format!(
                        "#{}  {}  {} / {}  {}kg",
                        i,
                        p.id.as_deref().unwrap_or("-"),
                        p.farmer_name.as_deref().unwrap_or("-"),
                        p.mushroom_type.as_deref().unwrap_or("-"),
                        p.total_weight.map(|w| w.to_string()).unwrap_or_else(|| "?".to_string())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ShellCommand::Inventory => self
                .app
                .inventory_api
                .list()?
                .iter()
                .map(|s| {
                    format!(
                        "{}  {}  {} {}  [{}]",
                        s.item.id, s.item.name, s.item.quantity, s.item.unit, s.status
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ShellCommand::Alerts => self
                .app
                .alert_api
                .list()?
                .iter()
                .map(|a| format!("{}  [{}] {}", a.id, a.alert_type, a.message))
                .collect::<Vec<_>>()
                .join("\n"),
            ShellCommand::Users => {
                self.actor()?;
                self.app
                    .user_api
                    .list_users()?
                    .iter()
                    .map(|u| format!("{}  {}  {}  [{}]", u.id, u.name, u.email, u.role))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ShellCommand::Receive {
                farmer,
                mushroom_type,
                total,
                spoiled,
            } => {
                let actor = self.actor()?;
                let batch = self.app.receiving_api.create_batch(
                    NewBatch {
                        farmer_name: farmer,
                        mushroom_type,
                        total_weight: total,
                        spoiled_weight: spoiled,
                        ..Default::default()
                    },
                    actor,
                )?;
                format!("已建批: {}", batch.id)
            }
            ShellCommand::Accept(target) => {
                let actor = self.actor()?;
                let batch = self.app.receiving_api.accept_delivery(&target, actor)?;
                format!("已验收: {} -> 批次 {}", target, batch.id)
            }
            ShellCommand::Discard(target) => {
                let actor = self.actor()?;
                self.app.receiving_api.discard_delivery(&target, actor)?;
                format!("已丢弃: {}", target)
            }
            ShellCommand::Import(path) => {
                let actor = self.actor()?;
                let report = self
                    .app
                    .receiving_api
                    .import_delivery_sheet(&path, actor)
                    .map_err(anyhow::Error::from)
                    .with_context(|| format!("导入 {}", path.display()))?;
                serde_json::to_string_pretty(&report)?
            }
            ShellCommand::Push => {
                let actor = self.actor()?;
                let report = self.app.sync_api.push(actor).await?;
                SyncApi::push_message(&report)
            }
            ShellCommand::Pull => {
                let actor = self.actor()?;
                let report = self.app.sync_api.pull(actor).await?;
                format!(
                    "received={} admitted={} duplicates={} pending={}",
                    report.received, report.admitted, report.duplicates, report.queue_len
                )
            }
        };
        Ok(Flow::Output(output))
    }
}

/// 运行交互式会话，直到 /quit 或 EOF
pub async fn run_shell(app: AppState) -> anyhow::Result<()> {
    let reader: PasswordReader = Box::new(|prompt: &str| rpassword::prompt_password(prompt));
    let mut session = ShellSession::new(app, reader);
    let mut rl = DefaultEditor::new().context("初始化行编辑器失败")?;

    println!("{} {}", crate::APP_NAME, crate::VERSION);
    println!("输入 help 查看命令，/quit 退出\n");
    info!("交互式会话开始");

    loop {
        match rl.readline(&session.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let command = match parse_line(line) {
                    Ok(command) => command,
                    Err(msg) => {
                        eprintln!("{}", msg);
                        continue;
                    }
                };
                match session.execute(command).await {
                    Ok(Flow::Output(text)) => {
                        if !text.is_empty() {
                            println!("{}", text);
                        }
                    }
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{}: {}", t("common.failed"), describe_error(&e)),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                warn!(error = %e, "读取输入失败");
                eprintln!("{}: {}", t("common.failed"), e);
                break;
            }
        }
    }

    info!("交互式会话结束");
    Ok(())
}
