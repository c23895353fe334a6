use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;

pub struct Md5Command;

#[async_trait]
impl CommandHandler for Md5Command {
    fn name(&self) -> &'static str {
        "md5"
    }

    fn description(&self) -> &'static str {
        "显示文件的 MD5（远程后端可能返回 ETag），用法：md5 <文件>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let [_, name] = args else {
            return CommandResponse::usage("md5 <文件>");
        };
        match storage.md5_file(name).await {
            Ok(Some(md5)) => CommandResponse::ok(md5, None),
            Ok(None) => CommandResponse::fail(format!("文件不存在: {}", name)),
            Err(e) => CommandResponse::from_error("计算 MD5 失败", e),
        }
    }
}
