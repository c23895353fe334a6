use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::info;
use serde_json::json;

pub struct PwdCommand;

#[async_trait]
impl CommandHandler for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn description(&self) -> &'static str {
        "显示当前工作目录，用法：pwd"
    }

    async fn handle(&self, _args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        info!("开始处理 pwd 命令");
        CommandResponse::ok(
            storage.current_dir(),
            Some(json!({
                "path": storage.current_dir(),
                "base": storage.base_dir(),
            })),
        )
    }
}
