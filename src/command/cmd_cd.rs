use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::debug;
use serde_json::json;

pub struct CdCommand;

#[async_trait]
impl CommandHandler for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn description(&self) -> &'static str {
        "切换当前工作目录（相对于基准目录），不带参数时回到基准目录，用法：cd [目录]"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        if args.len() > 2 {
            return CommandResponse::usage("cd [目录]");
        }
        let target = args.get(1).copied();
        debug!("切换目录: {} -> {:?}", storage.current_dir(), target);

        match storage.chdir(target).await {
            Ok(()) => CommandResponse::ok(
                "目录切换成功",
                Some(json!({ "path": storage.current_dir() })),
            ),
            Err(e) => CommandResponse::from_error("目录切换失败", e),
        }
    }
}
