use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;

pub struct RmCommand;

#[async_trait]
impl CommandHandler for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    fn description(&self) -> &'static str {
        "删除文件，用法：rm <文件>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let [_, name] = args else {
            return CommandResponse::usage("rm <文件>");
        };
        match storage.delete_file(name).await {
            Ok(true) => CommandResponse::ok("文件已删除", None),
            Ok(false) => CommandResponse::fail(format!("文件不存在: {}", name)),
            Err(e) => CommandResponse::from_error("删除文件失败", e),
        }
    }
}
