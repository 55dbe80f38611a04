//! 任务追踪服务主入口

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tasktrack::{
    config::AppConfig, handlers::health, middleware::AppState, repository::Storage, routes,
    telemetry,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("tasktrack {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(env) = std::env::var("TASKTRACK_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置（缺少 JWT 密钥时在这里失败）
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tasktrack starting...");

    // 3. 存储后端（PostgreSQL 会执行迁移）
    let storage = Storage::connect(&config.database).await?;

    tracing::info!(backend = %config.database.backend, "Storage initialized");

    // 4. 构建应用状态与路由
    let addr = config.server.addr.clone();
    let shutdown_timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let app_state = Arc::new(AppState::build(config, storage)?);
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 6. 优雅关闭：收到信号后等待进行中的请求，超时则强制退出
    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server_handle = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server_handle => {
            result??;
            tracing::info!("Server stopped");
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    shutdown.notify_one();

    match tokio::time::timeout(shutdown_timeout, server_handle).await {
        Ok(result) => {
            result??;
            tracing::info!("Server shutdown complete");
        }
        Err(_) => tracing::warn!("Graceful shutdown timeout reached, forcing exit"),
    }

    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("tasktrack {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: tasktrack [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过环境变量完成（前缀 TASKTRACK_，层级分隔符 __）");
    println!("  兼容 PORT 与 JWT_SECRET");
    println!("  可用选项请参考 .env.example");
}
