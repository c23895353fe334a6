use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;

pub struct RmdirCommand;

#[async_trait]
impl CommandHandler for RmdirCommand {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    fn description(&self) -> &'static str {
        "递归删除目录及其内容，用法：rmdir <目录>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let [_, name] = args else {
            return CommandResponse::usage("rmdir <目录>");
        };
        match storage.rmdir(name).await {
            Ok(()) => CommandResponse::ok("目录已删除", None),
            Err(e) => CommandResponse::from_error("删除目录失败", e),
        }
    }
}
