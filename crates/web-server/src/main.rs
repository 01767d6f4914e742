// Entry point for `cargo run -p web-server`; the root binary's `serve` command does the same.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = configuration::load_config()?;
    let _guard = configuration::init_tracing(&config.logging)?;

    web_server::run_server(&config).await
}
