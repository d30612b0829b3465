use cystoview::config::CystoViewConfig;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = CystoViewConfig::from_env();
    log::info!("analysis service: {}", config.api_base);
    cystoview::app::run(config)
}
