use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use serde_json::json;

pub struct WriteCommand;

#[async_trait]
impl CommandHandler for WriteCommand {
    fn name(&self) -> &'static str {
        "write"
    }

    fn description(&self) -> &'static str {
        "把文本写入文件（已存在则覆盖），用法：write <文件> <文本...>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        if args.len() < 3 {
            return CommandResponse::usage("write <文件> <文本...>");
        }
        let name = args[1];
        let text = args[2..].join(" ");
        match storage.put_file_contents(name, text.as_bytes()).await {
            Ok(()) => CommandResponse::ok(
                "写入成功",
                Some(json!({ "name": name, "bytes": text.len() })),
            ),
            Err(e) => CommandResponse::from_error("写入文件失败", e),
        }
    }
}
