use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::info;

pub struct MkdirCommand;

#[async_trait]
impl CommandHandler for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn description(&self) -> &'static str {
        "创建目录，用法：mkdir <目录>..."
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        if args.len() < 2 {
            return CommandResponse::usage("mkdir <目录>...");
        }
        for name in &args[1..] {
            if let Err(e) = storage.mkdir(name).await {
                return CommandResponse::from_error(&format!("创建目录 {} 失败", name), e);
            }
            info!("成功创建目录: {}", name);
        }
        CommandResponse::ok("目录创建成功", None)
    }
}
