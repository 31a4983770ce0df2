#[macro_use]
extern crate rocket;

mod auth;
mod config;
mod database;
mod db;
mod env;
mod error;
mod external;
mod models;
mod routes;
mod telemetry;
mod uploads;
mod validation;
#[cfg(test)]
mod test;

use rocket::fairing::AdHoc;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use auth::{
    logout, process_student_login, process_student_register, process_teacher_login,
    process_teacher_register, student_login, student_register, teacher_login, teacher_register,
    unauthorized,
};
use config::AppConfig;
use database::{MigrationError, ensure_achievements_schema};
use error::AppError;
use external::ExternalAuthConfig;
use routes::{
    all_achievements, home, student_achievements, student_dashboard, submit_achievement,
    submit_achievement_redirect, teacher_achievements_form, teacher_dashboard,
};
use telemetry::{TelemetryFairing, init_tracing, shutdown_telemetry};
use uploads::{UPLOADS_PREFIX, UploadSink};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("{0}")]
    Migration(#[from] MigrationError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let loaded_env_files = env::load_environment()?;
    init_tracing()?;

    for file in &loaded_env_files {
        info!("Loaded environment from {}", file);
    }

    let config = AppConfig::load()?;

    let external_auth = ExternalAuthConfig::from_env();
    match external_auth.validate() {
        Ok(()) => info!("External auth configuration present"),
        Err(e) => warn!("External auth not configured: {}", e),
    }

    let database_url = config.database_url();
    info!("Connecting to {}", database_url);
    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    if ensure_achievements_schema(&pool).await? {
        info!("Database schema updated");
    }

    rocket::tokio::fs::create_dir_all(&config.upload_folder)
        .await
        .map_err(AppError::from)?;

    init_rocket(pool, &config).launch().await?;

    Ok(())
}

pub fn init_rocket(pool: SqlitePool, config: &AppConfig) -> Rocket<Build> {
    info!("Starting achievement tracker");

    let uploads = UploadSink::from_config(config);
    let upload_dir = uploads.upload_dir().to_path_buf();

    rocket::custom(config.rocket_figment())
        .manage(pool)
        .manage(uploads)
        .mount(
            "/",
            routes![
                home,
                student_login,
                process_student_login,
                teacher_login,
                process_teacher_login,
                student_register,
                process_student_register,
                teacher_register,
                process_teacher_register,
                logout,
                teacher_achievements_form,
                submit_achievement,
                submit_achievement_redirect,
                teacher_dashboard,
                all_achievements,
                student_dashboard,
                student_achievements,
            ],
        )
        .mount(
            format!("/{}", UPLOADS_PREFIX),
            FileServer::new(upload_dir, Options::Missing),
        )
        .register("/", catchers![unauthorized])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async { shutdown_telemetry() })
        }))
}
