use super::{parse_transfer, CommandHandler, CommandResponse, Transfer};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::info;

pub struct CpCommand;

#[async_trait]
impl CommandHandler for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    fn description(&self) -> &'static str {
        "复制文件，外部路径用 --to-external / --from-external 标明，用法：cp [--to-external|--from-external] <源> <目标>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let Some((transfer, source, dest)) = parse_transfer(args) else {
            return CommandResponse::usage("cp [--to-external|--from-external] <源> <目标>");
        };
        info!("复制 {:?}: {} -> {}", transfer, source, dest);

        let result = match transfer {
            Transfer::Internal => storage.copy_file(source, dest).await,
            Transfer::ToExternal => storage.copy_file_to_external(source, dest).await,
            Transfer::FromExternal => storage.copy_file_from_external(source, dest).await,
        };
        match result {
            Ok(true) => CommandResponse::ok("复制成功", None),
            Ok(false) => CommandResponse::fail(format!("源文件不存在: {}", source)),
            Err(e) => CommandResponse::from_error("复制失败", e),
        }
    }
}
