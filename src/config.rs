//! Application configuration.
//!
//! Values come from built-in defaults overridden by plain environment
//! variables (after the env files in [`crate::env`] have been loaded):
//!
//! - `DATABASE_URL`: full sqlx SQLite URL, wins over `DB_PATH`
//! - `DB_PATH`: database file, default `ams.db`
//! - `UPLOAD_FOLDER`: certificate directory, default `static/uploads`
//! - `MAX_UPLOAD_SIZE`: e.g. `5 MiB` or a byte count, default 5 MiB
//! - `ALLOWED_EXTENSIONS`: e.g. `[pdf, png, jpg, jpeg]`
//! - `SECRET_KEY`: Rocket secret key (256-bit, base64 or hex)
//!
//! Rocket's own `ROCKET_*` variables and `Rocket.toml` still apply to the
//! server itself.

use rocket::data::{ByteUnit, Limits, ToByteUnit};
use rocket::figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_KEYS: [&str; 6] = [
    "DATABASE_URL",
    "DB_PATH",
    "UPLOAD_FOLDER",
    "MAX_UPLOAD_SIZE",
    "ALLOWED_EXTENSIONS",
    "SECRET_KEY",
];

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub db_path: PathBuf,
    pub upload_folder: PathBuf,
    pub max_upload_size: ByteUnit,
    pub allowed_extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_path: PathBuf::from("ams.db"),
            upload_folder: PathBuf::from("static/uploads"),
            max_upload_size: 5.mebibytes(),
            allowed_extensions: ["pdf", "png", "jpg", "jpeg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            secret_key: None,
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Env::raw().only(&ENV_KEYS))
    }

    pub fn load() -> Result<Self, rocket::figment::Error> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), rocket::figment::Error> {
        if self.allowed_extensions.is_empty() {
            return Err("ALLOWED_EXTENSIONS must name at least one extension"
                .to_string()
                .into());
        }

        if self.max_upload_size.as_u64() == 0 {
            return Err("MAX_UPLOAD_SIZE must be greater than zero".to_string().into());
        }

        Ok(())
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!("sqlite://{}", self.db_path.display()),
        }
    }

    /// Rocket's own figment with the upload limit and secret key applied.
    pub fn rocket_figment(&self) -> Figment {
        let limits = Limits::default()
            .limit("file", self.max_upload_size)
            .limit("data-form", self.max_upload_size);

        let figment = rocket::Config::figment().merge(("limits", limits));

        match &self.secret_key {
            Some(key) => figment.merge(("secret_key", key.as_str())),
            None => figment,
        }
    }
}
