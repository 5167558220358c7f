//! Configuration module for the travel back-office.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

const DEFAULT_UNSPLASH_URL: &str = "https://api.unsplash.com";
const DEFAULT_PEXELS_URL: &str = "https://api.pexels.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file backing the key-value store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub session_ttl_hours: i64,
    /// Offset used for "today" and daily buckets
    pub utc_offset_hours: i32,
    /// Seed admin account created by `/api/init`
    pub admin: AdminSeed,
    /// Image search providers
    pub images: ImageSearchConfig,
}

/// Credentials for the first admin account.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub name: String,
    /// `None` means a random password is generated and logged once
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageSearchConfig {
    pub unsplash_access_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub unsplash_url: String,
    pub pexels_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("TRAVEL_DB_PATH")
            .unwrap_or_else(|_| "./data/travel.sqlite".to_string())
            .into();

        let bind_addr = env::var("TRAVEL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid TRAVEL_BIND_ADDR: {}", e)))?;

        let jwt_secret = match non_empty_var("TRAVEL_JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "No TRAVEL_JWT_SECRET configured; sessions will not survive a restart"
                );
                format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
            }
        };

        let session_ttl_hours = parse_var("TRAVEL_SESSION_TTL_HOURS", 24)?;
        if session_ttl_hours <= 0 {
            return Err(AppError::Internal(
                "TRAVEL_SESSION_TTL_HOURS must be positive".to_string(),
            ));
        }

        let utc_offset_hours = parse_var("TRAVEL_UTC_OFFSET_HOURS", -3)?;
        if !(-23..=23).contains(&utc_offset_hours) {
            return Err(AppError::Internal(
                "TRAVEL_UTC_OFFSET_HOURS must be between -23 and 23".to_string(),
            ));
        }

        let admin = AdminSeed {
            email: env::var("TRAVEL_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@agencia.com.br".to_string()),
            name: env::var("TRAVEL_ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string()),
            password: non_empty_var("TRAVEL_ADMIN_PASSWORD"),
        };

        let images = ImageSearchConfig {
            unsplash_access_key: non_empty_var("UNSPLASH_ACCESS_KEY"),
            pexels_api_key: non_empty_var("PEXELS_API_KEY"),
            unsplash_url: env::var("TRAVEL_UNSPLASH_URL")
                .unwrap_or_else(|_| DEFAULT_UNSPLASH_URL.to_string()),
            pexels_url: env::var("TRAVEL_PEXELS_URL")
                .unwrap_or_else(|_| DEFAULT_PEXELS_URL.to_string()),
        };

        Ok(Self {
            db_path,
            bind_addr,
            jwt_secret,
            session_ttl_hours,
            utc_offset_hours,
            admin,
            images,
        })
    }

    /// The configured business-day offset.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

/// Log filter from `RUST_LOG`, else `TRAVEL_LOG_LEVEL` (default `info`).
///
/// Read on its own so logging is up before [`Config::from_env`] runs.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("TRAVEL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
