use super::{parse_transfer, CommandHandler, CommandResponse, Transfer};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::info;

pub struct MvCommand;

#[async_trait]
impl CommandHandler for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn description(&self) -> &'static str {
        "移动或重命名文件（先复制再删除源文件），用法：mv [--to-external|--from-external] <源> <目标>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let Some((transfer, source, dest)) = parse_transfer(args) else {
            return CommandResponse::usage("mv [--to-external|--from-external] <源> <目标>");
        };
        info!("移动 {:?}: {} -> {}", transfer, source, dest);

        let result = match transfer {
            Transfer::Internal => storage.rename_file(source, dest).await,
            Transfer::ToExternal => storage.move_file_to_external(source, dest).await,
            Transfer::FromExternal => storage.move_file_from_external(source, dest).await,
        };
        match result {
            Ok(true) => CommandResponse::ok("移动成功", None),
            Ok(false) => CommandResponse::fail(format!("源文件不存在: {}", source)),
            Err(e) => CommandResponse::from_error("移动失败", e),
        }
    }
}
