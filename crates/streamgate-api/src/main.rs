use streamgate_core::Config;

// mimalloc as the global allocator; lower fragmentation under many concurrent streams,
// especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = streamgate_api::setup::initialize_app(config.clone()).await?;

    streamgate_api::setup::server::start_server(&config, router, state.shutdown.clone()).await?;

    Ok(())
}
