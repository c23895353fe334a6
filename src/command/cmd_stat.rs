use super::{CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::error;

pub struct StatCommand;

#[async_trait]
impl CommandHandler for StatCommand {
    fn name(&self) -> &'static str {
        "stat"
    }

    fn description(&self) -> &'static str {
        "显示文件或目录的元数据（大小、类型、修改时间、校验和），用法：stat <名称>"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        let [_, name] = args else {
            return CommandResponse::usage("stat <名称>");
        };
        let info = match storage.fetch_file_info(name).await {
            Ok(Some(info)) if info.exists() => info,
            Ok(_) => return CommandResponse::fail(format!("文件不存在: {}", name)),
            Err(e) => return CommandResponse::from_error("读取文件信息失败", e),
        };

        match serde_json::to_value(&info) {
            Ok(data) => {
                let kind = info.kind.map(|k| k.to_string()).unwrap_or_default();
                let size = info.size.unwrap_or(0);
                CommandResponse::ok(format!("{} {} {}", info.name, kind, size), Some(data))
            }
            Err(e) => {
                error!("序列化文件信息失败: {}", e);
                CommandResponse::fail("序列化文件信息失败")
            }
        }
    }
}
