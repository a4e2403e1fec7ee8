//! 通知服务入口
//!
//! 加载配置、初始化数据库与推送组件，启动 HTTP 服务。

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, http::HeaderValue, middleware, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use diwan_notification::auth::{JwtConfig, JwtManager};
use diwan_notification::middleware::optional_auth_middleware;
use diwan_notification::push::{
    FcmSender, PushGateway, ServiceAccountKey, ServiceAccountTokenProvider,
};
use diwan_notification::repository::{
    DeviceRepository, NotificationRepository, UserRoleRepository,
};
use diwan_notification::{AppState, routes};
use diwan_shared::{AppConfig, Database, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("notification-service").unwrap_or_default();
    logging::init(&config.logging)?;

    info!("Starting notification-service on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;

    // JWT 密钥：生产环境必须通过环境变量注入，开发环境使用默认值
    let jwt_secret = std::env::var("DIWAN_JWT_SECRET").unwrap_or_else(|_| {
        if config.is_production() {
            panic!("DIWAN_JWT_SECRET must be set in production environment");
        }
        warn!("Using default JWT secret - set DIWAN_JWT_SECRET for production");
        JwtConfig::default().secret
    });
    let jwt_manager = JwtManager::new(JwtConfig {
        secret: jwt_secret,
        ..JwtConfig::default()
    });

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // 推送凭证在启动时解析一次，之后只读
    let service_account = ServiceAccountKey::from_file(&config.fcm.credentials_path)?;
    let token_provider = Arc::new(ServiceAccountTokenProvider::new(
        service_account,
        http.clone(),
    )?);
    let sender = Arc::new(FcmSender::new(&config.fcm, http));

    let notifications = Arc::new(NotificationRepository::new(db.clone()));
    let devices = Arc::new(DeviceRepository::new(db.clone()));
    let roles = Arc::new(UserRoleRepository::new(db.clone()));
    let gateway = Arc::new(PushGateway::new(
        devices.clone(),
        token_provider,
        sender,
    ));

    let state = AppState::new(notifications, devices, roles, gateway, jwt_manager);

    // CORS 配置：通过 DIWAN_CORS_ORIGINS 环境变量控制允许的来源
    let allowed_origins = std::env::var("DIWAN_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
    let cors = if allowed_origins == "*" {
        if config.is_production() {
            warn!("DIWAN_CORS_ORIGINS=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db;
                move || readiness_check(db_for_ready.clone())
            }),
        )
        .layer(cors)
        // 可选认证：Token 有效注入 Claims，否则按匿名继续
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM（K8s 停止 Pod）或 Ctrl+C 时，
    // 停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
/// 收到任一信号后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "notification-service"
    }))
}

/// 就绪探针：检查数据库连接是否可用
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "notification-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
