mod app;
mod i18n;
mod store;
mod target;

use eframe::NativeOptions;
use tracing_subscriber::EnvFilter;

use app::UiApp;

type DynError = Box<dyn std::error::Error + Send + Sync>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let options = NativeOptions::default();
    if let Err(e) = eframe::run_native(
        "Crotalpath",
        options,
        Box::new(|cc: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, DynError> {
            let app = UiApp::new(cc).map_err(DynError::from)?;
            Ok(Box::new(app))
        }),
    ) {
        eprintln!("Crotalpath stopped with an error: {e}");
    }
}
