use std::path::PathBuf;

pub const ENV_WORKSPACE: &str = "LABCHECK_WORKSPACE";
pub const ENV_EXPORT_DIR: &str = "LABCHECK_EXPORT_DIR";
pub const ENV_LOG: &str = "LABCHECK_LOG";
pub const DEFAULT_LOG_FILTER: &str = "labcheckd=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Workspace opened at startup; otherwise the shell sends `workspace.select`.
    pub workspace: Option<PathBuf>,
    /// Where `export.build` writes when the request names no `outDir`.
    pub export_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            export_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset. `RUST_LOG` is honoured when
    /// `LABCHECK_LOG` is absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            workspace: get(ENV_WORKSPACE).map(PathBuf::from),
            export_dir: get(ENV_EXPORT_DIR).map(PathBuf::from),
            log_filter: get(ENV_LOG)
                .or_else(|| get("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
