use stagehand::{resolve_asset_paths, AssetPaths, LoopConfig, Scene};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenes::LogoScene;

const RATE_ENV_VAR: &str = "STAGEHAND_RATE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) first_scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Stagehand Startup ===");

    let asset_paths = resolve_asset_paths().unwrap_or_else(|error| {
        warn!(error = %error, "asset_root_unresolved; using current directory");
        AssetPaths::from_root(".")
    });
    info!(
        root = %asset_paths.root.display(),
        images_dir = %asset_paths.images_dir.display(),
        "asset_paths"
    );

    let mut logo = LogoScene::new(asset_paths);
    if let Some(rate) = parse_rate_override(std::env::var(RATE_ENV_VAR).ok().as_deref()) {
        info!(rate, env_var = RATE_ENV_VAR, "rate_override");
        logo = logo.with_rate(rate);
    }

    let config = LoopConfig {
        window_title: "Stagehand Demo".to_string(),
        ..LoopConfig::default()
    };

    AppWiring {
        config,
        first_scene: Box::new(logo),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Values `<= 0` are kept and select render-only mode.
fn parse_rate_override(raw: Option<&str>) -> Option<i32> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    match raw.parse::<i32>() {
        Ok(rate) => Some(rate),
        Err(error) => {
            warn!(
                env_var = RATE_ENV_VAR,
                value = raw,
                error = %error,
                "unable to parse rate override; ignoring"
            );
            None
        }
    }
}
