use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local { media_root: PathBuf, media_url: String },
    S3(S3Config),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub max_upload_bytes: usize,
}

impl ImageConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=100).contains(&self.quality),
            "IMAGE_QUALITY must be within 1..=100"
        );
        anyhow::ensure!(self.max_width >= 1, "IMAGE_MAX_WIDTH must be at least 1");
        anyhow::ensure!(self.max_height >= 1, "IMAGE_MAX_HEIGHT must be at least 1");
        Ok(())
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            max_width: 800,
            max_height: 800,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub images: ImageConfig,
    /// Zone used to turn the form's wall-clock date/time into instants.
    #[serde(skip, default = "utc")]
    pub utc_offset: UtcOffset,
}

fn utc() -> UtcOffset {
    UtcOffset::UTC
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "trainerhub".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "trainerhub-web".into()),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES", 60 * 24 * 14)?,
            cookie_secure: env_parse("SESSION_COOKIE_SECURE", false)?,
        };

        let storage = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .as_str()
        {
            "local" => StorageConfig::Local {
                media_root: std::env::var("MEDIA_ROOT")
                    .unwrap_or_else(|_| "./media".into())
                    .into(),
                media_url: std::env::var("MEDIA_URL")
                    .unwrap_or_else(|_| "/media".into())
                    .trim_end_matches('/')
                    .to_string(),
            },
            "s3" => StorageConfig::S3(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            other => anyhow::bail!("STORAGE_BACKEND must be `local` or `s3`, got `{}`", other),
        };

        let defaults = ImageConfig::default();
        let images = ImageConfig {
            quality: env_parse("IMAGE_QUALITY", defaults.quality)?,
            max_width: env_parse("IMAGE_MAX_WIDTH", defaults.max_width)?,
            max_height: env_parse("IMAGE_MAX_HEIGHT", defaults.max_height)?,
            max_upload_bytes: env_parse("UPLOAD_MAX_BYTES", defaults.max_upload_bytes)?,
        };
        images.validate()?;

        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw).context("APP_UTC_OFFSET")?,
            Err(_) => UtcOffset::UTC,
        };

        Ok(Self {
            database_url,
            session,
            storage,
            images,
            utc_offset,
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// Parses offsets written as `+HH:MM` / `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), &format).map_err(|e| anyhow::anyhow!("invalid offset `{}`: {}", raw, e))
}
