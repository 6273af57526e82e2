use std::sync::Arc;

use chat_proxy::config::Config;
use chat_proxy::routes;
use chat_proxy::server;
use chat_proxy::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let port = config.port;
    let state = Arc::new(AppState::new(config));

    let app = routes::create_router().with_state(state);

    let (listener, addr) = server::bind_with_fallback(port).await?;

    println!("🚀 chat proxy running at http://localhost:{}", addr.port());
    println!("🔧 chat endpoint: http://localhost:{}/api/chat", addr.port());

    axum::serve(listener, app).await?;

    Ok(())
}
