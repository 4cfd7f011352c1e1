// Entry point for `cargo run -p web-server`: serves the configured snapshot
// without going through the full CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(None)?;
    let _guard = configuration::init_tracing(&config.logging)?;

    let addr = config.server.socket_addr().ok_or_else(|| {
        anyhow::anyhow!(
            "invalid server address {}:{}",
            config.server.host,
            config.server.port
        )
    })?;
    let state = web_server::build_state(&config)?;
    web_server::run_server(addr, state).await
}
