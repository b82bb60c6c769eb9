use crate::errors::BuildError;
use crate::models::{Language, LocalCounters, Theme};
use crate::ui::{render_index, PageMode};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: String,
    pub build_time: String,
    pub environment: String,
}

impl BuildInfo {
    pub fn now(environment: impl Into<String>) -> Self {
        Self {
            version: BUILD_VERSION.to_string(),
            build_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            environment: environment.into(),
        }
    }
}

/// Clears `dist_dir`, renders the local-storage pages into it and records
/// `build-info.json`.
pub async fn package(dist_dir: &Path, environment: &str) -> Result<BuildInfo, BuildError> {
    match fs::remove_dir_all(dist_dir).await {
        Ok(()) => info!("cleared {}", dist_dir.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let counters = LocalCounters::default();
    let pages = [
        (dist_dir.join("index.html"), Language::Zh),
        (dist_dir.join("en").join("index.html"), Language::En),
    ];
    for (path, lang) in pages {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let html = render_index(lang, Theme::Light, &counters, PageMode::Local);
        fs::write(&path, html).await?;
        info!("wrote {}", path.display());
    }

    let build_info = BuildInfo::now(environment);
    let payload = serde_json::to_vec_pretty(&build_info)?;
    fs::write(dist_dir.join("build-info.json"), payload).await?;
    info!(version = %build_info.version, environment, "package complete");

    Ok(build_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_dist_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("tribute_wall_dist_{}_{}", std::process::id(), nanos));
        path
    }

    #[tokio::test]
    async fn package_replaces_previous_output() {
        let dist = unique_dist_dir();
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("stale.js"), b"old").unwrap();

        let info = package(&dist, "staging").await.unwrap();

        assert!(!dist.join("stale.js").exists());
        assert!(dist.join("index.html").exists());
        assert!(dist.join("en").join("index.html").exists());

        let raw = std::fs::read_to_string(dist.join("build-info.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["environment"], "staging");
        assert!(json["buildTime"].as_str().unwrap().ends_with('Z'));
        assert_eq!(serde_json::from_str::<BuildInfo>(&raw).unwrap(), info);

        let _ = std::fs::remove_dir_all(&dist);
    }

    #[tokio::test]
    async fn package_creates_missing_dist_dir() {
        let dist = unique_dist_dir().join("nested").join("dist");
        package(&dist, "production").await.unwrap();

        let english = std::fs::read_to_string(dist.join("en").join("index.html")).unwrap();
        assert!(english.contains("Send Flowers"));
        assert!(english.contains("const MODE = 'local';"));

        let _ = std::fs::remove_dir_all(dist.parent().unwrap().parent().unwrap());
    }
}
