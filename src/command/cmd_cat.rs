use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::warn;

pub struct CatCommand;

#[async_trait]
impl CommandHandler for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn description(&self) -> &'static str {
        "显示文件内容，用法：cat <文件>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let [_, name] = args else {
            return CommandResponse::usage("cat <文件>");
        };
        match storage.fetch_file(name).await {
            Ok(Some(bytes)) => CommandResponse::ok(String::from_utf8_lossy(&bytes), None),
            Ok(None) => {
                warn!("文件不存在: {}", name);
                CommandResponse::fail(format!("文件不存在: {}", name))
            }
            Err(e) => CommandResponse::from_error("读取文件失败", e),
        }
    }
}
