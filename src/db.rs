use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::auth::{PasswordCheck, Role, check_password, hash_password};
use crate::error::AppError;
use crate::models::{
    Account, Achievement, DashboardStats, DbAccount, DbAchievement, NewAccount, NewAchievement,
};

const ACHIEVEMENT_COLUMNS: &str = "a.id, a.teacher_id, a.student_id, s.student_name,
    a.achievement_type, a.event_name, a.achievement_date, a.organizer, a.position,
    a.achievement_description, a.certificate_path, a.symposium_theme, a.programming_language,
    a.coding_platform, a.paper_title, a.journal_name, a.conference_level, a.conference_role,
    a.team_size, a.project_title, a.database_type, a.difficulty_level, a.other_description,
    a.created_at";

fn account_select(role: Role) -> String {
    let p = role.table();
    format!(
        "SELECT {p}_id AS id, {p}_name AS name, email, phone_number,
                {p}_gender AS gender, {p}_dept AS dept
         FROM {p}"
    )
}

#[instrument(skip(pool))]
pub async fn find_account(
    pool: &Pool<Sqlite>,
    role: Role,
    id: &str,
) -> Result<Option<Account>, AppError> {
    info!("Fetching account by id");
    let query = format!("{} WHERE {}_id = ?", account_select(role), role.table());

    let row = sqlx::query_as::<_, DbAccount>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into_account(role)))
}

#[instrument(skip_all, fields(role = %role, id = %account.id))]
pub async fn create_account(
    pool: &Pool<Sqlite>,
    role: Role,
    account: &NewAccount,
) -> Result<(), AppError> {
    info!("Creating new account");
    let p = role.table();

    let existing: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT {p}_id FROM {p} WHERE {p}_id = ? OR email = ?"
    ))
    .bind(&account.id)
    .bind(&account.email)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "A {} with ID '{}' or email '{}' already exists",
            role, account.id, account.email
        )));
    }

    let hashed_password = hash_password(&account.password)?;

    sqlx::query(&format!(
        "INSERT INTO {p} ({p}_name, {p}_id, email, phone_number, password, {p}_gender, {p}_dept)
         VALUES (?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&account.name)
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.phone_number)
    .bind(&hashed_password)
    .bind(&account.gender)
    .bind(&account.dept)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the account when `password` matches. An unknown id and a wrong
/// password both yield `None`.
#[instrument(skip(pool, password))]
pub async fn authenticate(
    pool: &Pool<Sqlite>,
    role: Role,
    id: &str,
    password: &str,
) -> Result<Option<Account>, AppError> {
    info!("Authenticating account");
    let p = role.table();

    let stored: Option<(String,)> =
        sqlx::query_as(&format!("SELECT password FROM {p} WHERE {p}_id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let Some((stored_password,)) = stored else {
        return Ok(None);
    };

    match check_password(password, &stored_password) {
        PasswordCheck::Valid => {}
        PasswordCheck::ValidLegacy => {
            warn!("Upgrading plaintext password to a hash");
            update_password(pool, role, id, password).await?;
        }
        PasswordCheck::Invalid => return Ok(None),
    }

    find_account(pool, role, id).await
}

#[instrument(skip(pool, new_password))]
pub async fn update_password(
    pool: &Pool<Sqlite>,
    role: Role,
    id: &str,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating account password");
    let p = role.table();
    let hashed_password = hash_password(new_password)?;

    sqlx::query(&format!("UPDATE {p} SET password = ? WHERE {p}_id = ?"))
        .bind(&hashed_password)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(teacher_id = %achievement.teacher_id, student_id = %achievement.student_id))]
pub async fn insert_achievement(
    pool: &Pool<Sqlite>,
    achievement: &NewAchievement,
) -> Result<i64, AppError> {
    info!("Inserting achievement");
    let details = &achievement.details;

    let res = sqlx::query(
        "INSERT INTO achievements (
            student_id, teacher_id, achievement_type, event_name, achievement_date,
            organizer, position, achievement_description, certificate_path,
            symposium_theme, programming_language, coding_platform, paper_title,
            journal_name, conference_level, conference_role, team_size,
            project_title, database_type, difficulty_level, other_description,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(&achievement.student_id)
    .bind(&achievement.teacher_id)
    .bind(&achievement.achievement_type)
    .bind(&achievement.event_name)
    .bind(&achievement.achievement_date)
    .bind(&achievement.organizer)
    .bind(&achievement.position)
    .bind(&achievement.description)
    .bind(&achievement.certificate_path)
    .bind(&details.symposium_theme)
    .bind(&details.programming_language)
    .bind(&details.coding_platform)
    .bind(&details.paper_title)
    .bind(&details.journal_name)
    .bind(&details.conference_level)
    .bind(&details.conference_role)
    .bind(details.team_size)
    .bind(&details.project_title)
    .bind(&details.database_type)
    .bind(&details.difficulty_level)
    .bind(&details.other_description)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Counts for the teacher dashboard. `since` is the first achievement date
/// that counts towards `this_week`.
#[instrument(skip(pool))]
pub async fn teacher_dashboard_stats(
    pool: &Pool<Sqlite>,
    teacher_id: &str,
    since: NaiveDate,
) -> Result<DashboardStats, AppError> {
    info!("Computing teacher dashboard stats");

    let (total_achievements, students_managed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(DISTINCT student_id) FROM achievements WHERE teacher_id = ?",
    )
    .bind(teacher_id)
    .fetch_one(pool)
    .await?;

    let (this_week,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM achievements WHERE teacher_id = ? AND achievement_date >= ?",
    )
    .bind(teacher_id)
    .bind(since.format("%Y-%m-%d").to_string())
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_achievements,
        students_managed,
        this_week,
    })
}

#[instrument(skip(pool))]
pub async fn recent_achievements_for_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: &str,
    limit: i64,
) -> Result<Vec<Achievement>, AppError> {
    info!("Getting recent achievements for teacher");
    let rows = sqlx::query_as::<_, DbAchievement>(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS}
         FROM achievements a
         JOIN student s ON a.student_id = s.student_id
         WHERE a.teacher_id = ?
         ORDER BY a.created_at DESC, a.id DESC
         LIMIT ?"
    ))
    .bind(teacher_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Achievement::from).collect())
}

#[instrument(skip(pool))]
pub async fn achievements_for_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: &str,
) -> Result<Vec<Achievement>, AppError> {
    info!("Getting all achievements for teacher");
    let rows = sqlx::query_as::<_, DbAchievement>(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS}
         FROM achievements a
         JOIN student s ON a.student_id = s.student_id
         WHERE a.teacher_id = ?
         ORDER BY a.achievement_date DESC, a.id DESC"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    // No error thrown if there are no achievements found
    Ok(rows.into_iter().map(Achievement::from).collect())
}

#[instrument(skip(pool))]
pub async fn achievements_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<Achievement>, AppError> {
    info!("Getting achievements for student");
    let rows = sqlx::query_as::<_, DbAchievement>(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS}
         FROM achievements a
         JOIN student s ON a.student_id = s.student_id
         WHERE a.student_id = ?
         ORDER BY a.achievement_date DESC, a.id DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Achievement::from).collect())
}
