use super::{entries_json, CommandHandler, CommandResponse};
use crate::vfs::StorageFacade;
use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;

pub struct LsCommand;

enum Listing {
    All,
    Dirs,
    Files,
}

#[async_trait]
impl CommandHandler for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn description(&self) -> &'static str {
        "显示当前目录内容，-d 只列目录，-f 只列文件，模式支持 *后缀 与 前缀*，用法：ls [-d|-f] [模式]"
    }

    async fn handle(&self, args: &[&str], storage: &mut StorageFacade) -> CommandResponse {
        info!("开始处理 ls 命令");

        let mut listing = Listing::All;
        let mut pattern = None;
        for arg in &args[1..] {
            match *arg {
                "-d" => listing = Listing::Dirs,
                "-f" => listing = Listing::Files,
                other if pattern.is_none() => pattern = Some(other),
                _ => return CommandResponse::usage("ls [-d|-f] [模式]"),
            }
        }
        debug!("处理 ls 命令，模式: {:?}", pattern);

        let result = match listing {
            Listing::All => storage.list_all(pattern).await,
            Listing::Dirs => storage.list_dirs(pattern).await,
            Listing::Files => storage.list_files(pattern).await,
        };

        match result {
            Ok(entries) => CommandResponse::ok(
                entries
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join("  "),
                Some(json!({
                    "path": storage.current_dir(),
                    "contents": entries_json(&entries),
                })),
            ),
            Err(e) => CommandResponse::from_error("获取目录内容失败", e),
        }
    }
}
