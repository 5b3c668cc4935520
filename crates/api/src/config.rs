use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sigcraft_core::animation::{FrameConfig, DEFAULT_FRAME_COUNT, DEFAULT_FRAME_DELAY_MS};
use sigcraft_pipeline::bake::SocialBakeMode;
use sigcraft_pipeline::ExportConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Postgres URL. Unset means signatures are kept in memory.
    pub database_url: Option<String>,
    /// Public origin of this server; relative image references and
    /// generated rasters resolve against it.
    pub public_base_url: String,
    /// Base URL of the static social icon sets.
    pub icon_base_url: String,
    /// Directory generated rasters are written to, served at `/generated`.
    pub raster_dir: PathBuf,
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    /// Upper bound on baking animated elements for one export.
    pub export_timeout_secs: u64,
    /// Number of pooled rendering surfaces.
    pub render_surfaces: usize,
    /// How long an export waits for a free surface.
    pub surface_acquire_timeout_ms: u64,
    pub social_mode: SocialBakeMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 60,
            database_url: None,
            public_base_url: "http://localhost:3000".into(),
            icon_base_url: "http://localhost:3000/icons".into(),
            raster_dir: PathBuf::from("./generated"),
            frame_count: DEFAULT_FRAME_COUNT,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            export_timeout_secs: 30,
            render_surfaces: 2,
            surface_acquire_timeout_ms: 5_000,
            social_mode: SocialBakeMode::default(),
        }
    }
}

fn var(name: &'static str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                       |
    /// |-------------------------|-------------------------------|
    /// | `HOST`                  | `0.0.0.0`                     |
    /// | `PORT`                  | `3000`                        |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS`  | `60`                          |
    /// | `DATABASE_URL`          | unset (in-memory store)       |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:3000`       |
    /// | `ICON_BASE_URL`         | `{PUBLIC_BASE_URL}/icons`     |
    /// | `RASTER_DIR`            | `./generated`                 |
    /// | `ANIMATION_FRAME_COUNT` | `20`                          |
    /// | `ANIMATION_FRAME_MS`    | `120`                         |
    /// | `EXPORT_TIMEOUT_SECS`   | `30`                          |
    /// | `RENDER_SURFACES`       | `2`                           |
    /// | `SURFACE_ACQUIRE_MS`    | `5000`                        |
    /// | `SOCIAL_BAKE_MODE`      | `per-icon`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or(defaults.public_base_url)
            .trim_end_matches('/')
            .to_string();
        let icon_base_url = var("ICON_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{public_base_url}/icons"));

        let social_mode = match var("SOCIAL_BAKE_MODE") {
            Some(value) => SocialBakeMode::from_name(&value).ok_or_else(|| ConfigError::Invalid {
                var: "SOCIAL_BAKE_MODE",
                reason: "expected 'per-icon' or 'flatten'".into(),
                value,
            })?,
            None => defaults.social_mode,
        };

        let render_surfaces: usize = parsed("RENDER_SURFACES", defaults.render_surfaces)?;
        if render_surfaces == 0 {
            return Err(ConfigError::Invalid {
                var: "RENDER_SURFACES",
                value: "0".into(),
                reason: "at least one surface is required".into(),
            });
        }

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT", defaults.port)?,
            cors_origins,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            database_url: var("DATABASE_URL"),
            public_base_url,
            icon_base_url,
            raster_dir: var("RASTER_DIR").map(PathBuf::from).unwrap_or(defaults.raster_dir),
            frame_count: parsed("ANIMATION_FRAME_COUNT", defaults.frame_count)?,
            frame_delay_ms: parsed("ANIMATION_FRAME_MS", defaults.frame_delay_ms)?,
            export_timeout_secs: parsed("EXPORT_TIMEOUT_SECS", defaults.export_timeout_secs)?,
            render_surfaces,
            surface_acquire_timeout_ms: parsed(
                "SURFACE_ACQUIRE_MS",
                defaults.surface_acquire_timeout_ms,
            )?,
            social_mode,
        })
    }

    /// Public URL prefix generated rasters are served under.
    pub fn generated_base_url(&self) -> String {
        format!("{}/generated", self.public_base_url)
    }

    /// Pipeline settings derived from this configuration. Frame values
    /// are clamped to their accepted bounds.
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            base_url: self.public_base_url.clone(),
            icon_base_url: self.icon_base_url.clone(),
            frames: FrameConfig::clamped(self.frame_count, self.frame_delay_ms),
            timeout: Duration::from_secs(self.export_timeout_secs),
            social_mode: self.social_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_config_clamps_frames() {
        let config = ServerConfig {
            frame_count: 10_000,
            frame_delay_ms: 1,
            ..ServerConfig::default()
        };
        let export = config.export_config();
        assert_eq!(export.frames.frame_count, sigcraft_core::animation::MAX_FRAME_COUNT);
        assert_eq!(export.frames.frame_delay_ms, sigcraft_core::animation::MIN_FRAME_DELAY_MS);
        assert_eq!(export.timeout, Duration::from_secs(30));
    }

    #[test]
    fn generated_rasters_live_under_public_origin() {
        let config = ServerConfig {
            public_base_url: "https://sig.example.com".into(),
            ..ServerConfig::default()
        };
        assert_eq!(config.generated_base_url(), "https://sig.example.com/generated");
    }
}
