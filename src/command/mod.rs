use crate::vfs::{Entry, StorageFacade, VfsError};
use actix_web::{web, HttpResponse, Responder};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

mod cmd_cat;
mod cmd_cd;
mod cmd_cp;
mod cmd_ls;
mod cmd_md5;
mod cmd_mkdir;
mod cmd_mv;
mod cmd_pwd;
mod cmd_rm;
mod cmd_rmdir;
mod cmd_stat;
mod cmd_write;
pub mod session;

pub use session::SessionManager;

// 命令处理器的trait
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse;
}

// 命令响应结构体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn usage(usage: &str) -> Self {
        Self::fail(format!("用法: {}", usage))
    }

    pub fn from_error(context: &str, err: VfsError) -> Self {
        error!("{}: {}", context, err);
        Self::fail(format!("{}: {}", context, err))
    }
}

/// 列表结果转成 JSON 数组
pub(crate) fn entries_json(entries: &[Entry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| json!({ "name": entry.name, "kind": entry.kind }))
            .collect(),
    )
}

/// cp / mv 的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    Internal,
    ToExternal,
    FromExternal,
}

/// 解析 `[--to-external|--from-external] <源> <目标>`
pub(crate) fn parse_transfer<'a>(args: &[&'a str]) -> Option<(Transfer, &'a str, &'a str)> {
    let (transfer, rest) = match args.get(1).copied() {
        Some("--to-external") => (Transfer::ToExternal, &args[2..]),
        Some("--from-external") => (Transfer::FromExternal, &args[2..]),
        Some(_) => (Transfer::Internal, &args[1..]),
        None => return None,
    };
    match rest {
        [source, dest] => Some((transfer, *source, *dest)),
        _ => None,
    }
}

// 命令注册器
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn CommandHandler>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        registry.register(Box::new(cmd_pwd::PwdCommand));
        registry.register(Box::new(cmd_cd::CdCommand));
        registry.register(Box::new(cmd_ls::LsCommand));
        registry.register(Box::new(cmd_mkdir::MkdirCommand));
        registry.register(Box::new(cmd_rmdir::RmdirCommand));
        registry.register(Box::new(cmd_cat::CatCommand));
        registry.register(Box::new(cmd_write::WriteCommand));
        registry.register(Box::new(cmd_rm::RmCommand));
        registry.register(Box::new(cmd_cp::CpCommand));
        registry.register(Box::new(cmd_mv::MvCommand));
        registry.register(Box::new(cmd_stat::StatCommand));
        registry.register(Box::new(cmd_md5::Md5Command));

        info!("命令注册器初始化完成");
        registry
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        let name = handler.name().to_string();
        self.commands.insert(name.clone(), handler);
        debug!("注册命令: {}", name);
    }

    pub fn get_handler(&self, command_name: &str) -> Option<&dyn CommandHandler> {
        self.commands.get(command_name).map(|h| h.as_ref())
    }

    pub fn get_command_description(&self, command_name: &str) -> Option<String> {
        match command_name {
            "help" => Some("显示所有可用命令的帮助信息".to_string()),
            "description" => Some("显示某个命令的说明，用法：description <命令>".to_string()),
            _ => self
                .commands
                .get(command_name)
                .map(|h| h.description().to_string()),
        }
    }

    /// 按名称排序的帮助文本
    pub fn help_text(&self) -> String {
        let mut lines: Vec<String> = self
            .commands
            .values()
            .map(|h| format!("- {}: {}", h.name(), h.description()))
            .collect();
        for name in ["help", "description"] {
            if let Some(description) = self.get_command_description(name) {
                lines.push(format!("- {}: {}", name, description));
            }
        }
        lines.sort();
        format!("可用命令:\n{}", lines.join("\n"))
    }

    /// 解析并执行一行命令
    pub async fn execute(
        &self,
        command_line: &str,
        storage: &mut StorageFacade,
    ) -> CommandResponse {
        let args: Vec<&str> = command_line.split_whitespace().collect();
        let Some(&name) = args.first() else {
            warn!("空命令");
            return CommandResponse::fail("命令不能为空");
        };

        match name {
            "help" => CommandResponse::ok(self.help_text(), None),
            "description" => match args.get(1) {
                Some(target) => match self.get_command_description(target) {
                    Some(description) => CommandResponse::ok(description, None),
                    None => CommandResponse::fail(format!("未知命令: {}", target)),
                },
                None => CommandResponse::usage("description <命令>"),
            },
            _ => match self.get_handler(name) {
                Some(handler) => {
                    debug!("执行命令: {}", name);
                    handler.handle(&args, storage).await
                }
                None => {
                    warn!("未知命令: {}", name);
                    CommandResponse::fail(format!("未知命令: {}", name))
                }
            },
        }
    }
}

/// 控制台的共享状态
pub struct ConsoleState {
    pub registry: CommandRegistry,
    pub sessions: SessionManager,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub session_id: String,
}

// 创建会话
pub async fn open_session(data: web::Data<ConsoleState>) -> impl Responder {
    match data.sessions.open().await {
        Ok(session_id) => {
            info!("创建会话: {}", session_id);
            HttpResponse::Ok().json(CommandResponse::ok(
                "会话已创建",
                Some(json!({ "session_id": session_id })),
            ))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(CommandResponse::from_error("创建会话失败", e)),
    }
}

// 处理命令的主函数
pub async fn handle_command(
    cmd: web::Json<CommandRequest>,
    data: web::Data<ConsoleState>,
) -> impl Responder {
    info!(
        "收到命令请求: {} (session_id: {})",
        cmd.command, cmd.session_id
    );

    let Some(storage) = data.sessions.get(&cmd.session_id) else {
        warn!("会话不存在或已过期: {}", cmd.session_id);
        return HttpResponse::Unauthorized().json(CommandResponse::fail("会话不存在或已过期"));
    };

    let mut storage = storage.lock().await;
    let response = data.registry.execute(&cmd.command, &mut storage).await;
    if response.success {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::BadRequest().json(response)
    }
}
