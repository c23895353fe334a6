use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;
use std::time::Duration;

use unistore::command::{
    handle_command, open_session, CommandRegistry, ConsoleState, SessionManager,
};
use unistore::logger::Logger;
use unistore::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 加载 .env 并解析配置
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("加载配置失败: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    // 初始化日志系统：配置了日志文件则写文件，否则交给 env_logger
    match &config.log_file {
        Some(log_path) => {
            if let Err(e) = Logger::init(log_path) {
                eprintln!("初始化日志系统失败: {}", e);
            }
        }
        None => env_logger::init(),
    }

    info!("应用程序启动，存储后端: {}", backend_label(&config));

    let state = web::Data::new(ConsoleState {
        registry: CommandRegistry::new(),
        sessions: SessionManager::new(config.backend.clone(), config.session_ttl),
    });

    // 启动会话清理任务
    let cleanup_state = state.clone();
    let interval = config.session_ttl.min(Duration::from_secs(60)).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            cleanup_state.sessions.cleanup_expired();
        }
    });

    let bind = (config.host.clone(), config.port);
    info!("服务器启动在 http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/api/session", web::post().to(open_session))
            .route("/api/command", web::post().to(handle_command))
    })
    .bind(bind)
    .map_err(|e| {
        error!("端口绑定失败: {}", e);
        e
    })?
    .run()
    .await
}

/// 日志里不输出账户密钥
fn backend_label(config: &Config) -> &'static str {
    match config.backend {
        unistore::StorageBackend::Local { .. } => "local",
        unistore::StorageBackend::Memory { .. } => "memory",
        unistore::StorageBackend::Azure { .. } => "azure",
    }
}
