#[cfg(test)]
pub mod test_utils {
    use crate::auth::Role;
    use crate::config::AppConfig;
    use crate::database::ensure_achievements_schema;
    use crate::db::{create_account, insert_achievement};
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::{DetailColumns, NewAccount, NewAchievement};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::path::PathBuf;
    use std::sync::Once;
    use uuid::Uuid;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";
    pub const BOUNDARY: &str = "----achievement-tracker-test-boundary";

    #[derive(Default)]
    pub struct TestDbBuilder {
        accounts: Vec<TestAccount>,
        achievements: Vec<TestAchievement>,
    }

    pub struct TestAccount {
        pub role: Role,
        pub id: String,
        pub name: String,
        pub password: String,
    }

    pub struct TestAchievement {
        pub teacher_id: String,
        pub student_id: String,
        pub achievement_type: String,
        pub event_name: String,
        pub achievement_date: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(self, id: &str, name: &str) -> Self {
            self.account_with_password(Role::Student, id, name, STANDARD_PASSWORD)
        }

        pub fn teacher(self, id: &str, name: &str) -> Self {
            self.account_with_password(Role::Teacher, id, name, STANDARD_PASSWORD)
        }

        pub fn account_with_password(
            mut self,
            role: Role,
            id: &str,
            name: &str,
            password: &str,
        ) -> Self {
            self.accounts.push(TestAccount {
                role,
                id: id.to_string(),
                name: name.to_string(),
                password: password.to_string(),
            });
            self
        }

        pub fn achievement(
            mut self,
            teacher_id: &str,
            student_id: &str,
            achievement_type: &str,
            event_name: &str,
            achievement_date: &str,
        ) -> Self {
            self.achievements.push(TestAchievement {
                teacher_id: teacher_id.to_string(),
                student_id: student_id.to_string(),
                achievement_type: achievement_type.to_string(),
                event_name: event_name.to_string(),
                achievement_date: achievement_date.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter("debug")
                    .with_test_writer()
                    .try_init();
            });

            let pool = memory_pool().await;
            ensure_achievements_schema(&pool).await?;

            for account in &self.accounts {
                let new_account = NewAccount {
                    id: account.id.clone(),
                    name: account.name.clone(),
                    email: format!("{}@example.edu", account.id.to_lowercase()),
                    phone_number: None,
                    password: account.password.clone(),
                    gender: None,
                    dept: Some("CSE".to_string()),
                };
                create_account(&pool, account.role, &new_account).await?;
            }

            for achievement in self.achievements {
                let new_achievement = NewAchievement {
                    teacher_id: achievement.teacher_id,
                    student_id: achievement.student_id,
                    achievement_type: achievement.achievement_type,
                    event_name: achievement.event_name,
                    achievement_date: achievement.achievement_date,
                    organizer: "Test Org".to_string(),
                    position: "First".to_string(),
                    description: None,
                    certificate_path: None,
                    details: DetailColumns::default(),
                };
                insert_achievement(&pool, &new_achievement).await?;
            }

            let upload_dir =
                std::env::temp_dir().join(format!("achievement-tracker-{}", Uuid::new_v4()));

            Ok(TestDb { pool, upload_dir })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub upload_dir: PathBuf,
    }

    impl TestDb {
        pub async fn achievement_count(&self) -> i64 {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM achievements")
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count achievements");
            count
        }

        pub fn uploaded_files(&self) -> Vec<String> {
            match std::fs::read_dir(&self.upload_dir) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect(),
                Err(_) => Vec::new(),
            }
        }

        pub fn config(&self) -> AppConfig {
            AppConfig {
                upload_folder: self.upload_dir.clone(),
                ..AppConfig::default()
            }
        }
    }

    impl Drop for TestDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.upload_dir);
        }
    }

    /// One connection only: every in-memory connection is a separate database.
    pub async fn memory_pool() -> Pool<Sqlite> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database")
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .teacher("T1", "Teacher One")
            .teacher("T2", "Teacher Two")
            .student("S1", "Student One")
            .student("S2", "Student Two")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let config = test_db.config();
        setup_test_client_with_config(test_db, config).await
    }

    pub async fn setup_test_client_with_config(
        test_db: TestDb,
        config: AppConfig,
    ) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), &config);
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build rocket client");
        (client, test_db)
    }

    pub async fn login(client: &Client, role: Role, id: &str, password: &str) -> Status {
        client
            .post(role.login_path())
            .header(ContentType::Form)
            .body(format!("{}_id={}&password={}", role.as_str(), id, password))
            .dispatch()
            .await
            .status()
    }

    pub struct CertificateUpload<'a> {
        pub filename: &'a str,
        pub content: &'a [u8],
    }

    pub fn multipart_content_type() -> ContentType {
        ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY))
    }

    pub fn multipart_body(fields: &[(&str, &str)], certificate: Option<CertificateUpload>) -> Vec<u8> {
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }

        if let Some(upload) = certificate {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"certificate\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    upload.filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(upload.content);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    /// Required fields of a valid submission for `student_id`.
    pub fn achievement_fields<'a>(
        student_id: &'a str,
        achievement_type: &'a str,
        achievement_date: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        vec![
            ("student_id", student_id),
            ("achievement_type", achievement_type),
            ("event_name", "Smart India Hackathon"),
            ("achievement_date", achievement_date),
            ("organizer", "AICTE"),
            ("position", "Winner"),
        ]
    }
}
