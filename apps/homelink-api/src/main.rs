//! homelink HTTP API：操作员控制、设备轮询/回执/自报日志、审计查询与请求追踪 ID。

mod handlers;
mod middleware;
mod routes;
mod utils;

use homelink_auth::{DeviceSignatureVerifier, JwtManager};
use homelink_config::AppConfig;
use homelink_control::{
    AuditRecorder, ControlConfig, ControlService, DeviceGateway, spawn_audit_retention_task,
};
use homelink_storage::{
    AuditLogStore, CommandStore, DeviceStore, InMemoryAuditLogStore, InMemoryCommandStore,
    InMemoryDeviceStore, PgAuditLogStore, PgCommandStore, PgDeviceStore, connect_pool,
};
use homelink_telemetry::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
    pub control: Arc<ControlService>,
    pub gateway: Arc<DeviceGateway>,
    pub audit: Arc<AuditRecorder>,
}

/// 三类持久化存储。
pub struct Stores {
    pub devices: Arc<dyn DeviceStore>,
    pub commands: Arc<dyn CommandStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            devices: Arc::new(InMemoryDeviceStore::new()),
            commands: Arc::new(InMemoryCommandStore::new()),
            audit_logs: Arc::new(InMemoryAuditLogStore::new()),
        }
    }
}

impl AppState {
    pub fn new(stores: Stores, jwt: JwtManager, config: ControlConfig) -> Self {
        let audit = Arc::new(AuditRecorder::new(stores.audit_logs));
        let verifier = Arc::new(DeviceSignatureVerifier::new(stores.devices.clone()));
        let control = ControlService::new(
            stores.devices,
            stores.commands.clone(),
            audit.clone(),
            config.clone(),
        );
        let gateway = DeviceGateway::new(verifier, stores.commands, audit.clone(), config);
        Self {
            jwt: Arc::new(jwt),
            control: Arc::new(control),
            gateway: Arc::new(gateway),
            audit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // 未配置数据库时使用内存存储（重启即丢失）
    let stores = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_pool(database_url, config.database_max_connections).await?;
            Stores {
                devices: Arc::new(PgDeviceStore::new(pool.clone())),
                commands: Arc::new(PgCommandStore::new(pool.clone())),
                audit_logs: Arc::new(PgAuditLogStore::new(pool)),
            }
        }
        None => {
            warn!(target: "homelink.api", "in_memory_storage_selected");
            Stores::in_memory()
        }
    };

    let jwt = JwtManager::new(config.jwt_secret.clone());
    let control_config = ControlConfig {
        snooze_default_seconds: config.snooze_default_seconds,
        redelivery_after_ms: config.command_redelivery_seconds.saturating_mul(1000),
        audit_retention_days: config.audit_retention_days,
    };
    let state = AppState::new(stores, jwt, control_config);

    let _sweeper = spawn_audit_retention_task(
        state.audit.clone(),
        config.audit_retention_days,
        config.audit_sweep_interval_seconds,
    );

    // 同时挂载在 / 与 /api 下
    let app = routes::create_api_router()
        .nest("/api", routes::create_api_router())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        // 注入 request_id/trace_id
        .layer(axum::middleware::from_fn(middleware::request_context));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(
        target: "homelink.api",
        http_addr = %config.http_addr,
        "http_server_started"
    );
    // 无代理头时审计取对端地址
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
