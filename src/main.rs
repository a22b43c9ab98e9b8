use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use crewboard::{AppState, config::Config, database, routes, routes::user::model::bootstrap_admin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 打开存储（Postgres 或进程内存储）
    let store = database::open_store(&config).await?;

    // 设置应用状态
    let state = AppState::new(config, store)?;

    // 首个管理员
    if let Some(admin) = state.config.admin_bootstrap.clone() {
        if let Err(e) = bootstrap_admin(&state, &admin).await {
            tracing::error!("Failed to bootstrap admin account: {}", e);
        }
    }

    let app = routes::create_router(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr).await?,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
