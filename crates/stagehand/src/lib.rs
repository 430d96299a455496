use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    compose_frame, load_image, run_app, run_app_with_metrics, AppError, Canvas, CanvasTransform,
    Color, Display, DisplayBackend, DisplayError, DueWork, GameHost, HostError, HostState, Image,
    InputEvent, InputKind, KeyCode, KeyInput, LogicalSize, LoopConfig, LoopMetricsSnapshot,
    MetricsHandle, MouseButton, PixelRect, Point, PointerInput, PumpReport, Renderer,
    ResourceError, Scene, SceneCommand, SceneContext, SceneDescriptor, SceneError, Scheduler,
    ScratchStore, TickRate, Viewport, WheelInput, DEFAULT_HEIGHT, DEFAULT_MAX_CATCH_UP_TICKS,
    DEFAULT_METRICS_INTERVAL, DEFAULT_RATE, DEFAULT_WIDTH,
};

pub const ASSET_ROOT_ENV_VAR: &str = "STAGEHAND_ASSET_ROOT";

/// Locations of the files scenes load at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub images_dir: PathBuf,
}

impl AssetPaths {
    /// `root` is the directory that contains `assets/`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let images_dir = root.join("assets").join("images");
        Self { root, images_dir }
    }

    pub fn image(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("{env_var} is set but does not point to a directory containing assets/: {path}")]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
}

/// Uses `STAGEHAND_ASSET_ROOT` when set, otherwise the nearest ancestor of the
/// executable with an `assets/` directory, otherwise the current directory.
pub fn resolve_asset_paths() -> Result<AssetPaths, StartupError> {
    let root = match env::var(ASSET_ROOT_ENV_VAR) {
        Ok(value) => {
            let root = normalize_path(Path::new(&value));
            if !has_assets_dir(&root) {
                return Err(StartupError::InvalidEnvRoot {
                    path: root,
                    env_var: ASSET_ROOT_ENV_VAR,
                });
            }
            root
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            match find_asset_root(&exe) {
                Some(root) => root,
                None => env::current_dir().map_err(StartupError::CurrentDir)?,
            }
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ASSET_ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AssetPaths::from_root(root))
}

fn find_asset_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| has_assets_dir(candidate))
        .map(normalize_path)
}

fn has_assets_dir(path: &Path) -> bool {
    path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn asset_root_is_nearest_ancestor_with_assets() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("assets").join("images")).expect("assets");
        let exe_dir = dir.path().join("target").join("debug");
        fs::create_dir_all(&exe_dir).expect("exe dir");

        let root = find_asset_root(&exe_dir.join("stagehand_demo")).expect("root");

        assert_eq!(root, normalize_path(dir.path()));
    }

    #[test]
    fn no_assets_anywhere_finds_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("nested");

        assert!(!has_assets_dir(&nested));
        assert!(!has_assets_dir(dir.path()));
    }

    #[test]
    fn image_paths_live_under_assets_images() {
        let paths = AssetPaths::from_root("/game");

        assert_eq!(paths.images_dir, Path::new("/game/assets/images"));
        assert_eq!(paths.image("logo.png"), Path::new("/game/assets/images/logo.png"));
    }
}
