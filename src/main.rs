use color_eyre::eyre::Result;
use landfall::{app::App, logging, settings::Settings};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = Settings::load();
    logging::init(Settings::data_dir()?, settings.debug_mode)?;
    log::info!("Landfall start: {}", chrono::Local::now());

    let mut app = App::new(settings)?;
    app.run().await
}
