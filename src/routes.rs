use chrono::{Duration, Local, NaiveDate};
use rocket::State;
use rocket::form::{Errors, Form};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{Identity, Role, StudentSession, TeacherSession};
use crate::db;
use crate::error::AppError;
use crate::models::{AchievementCategory, DetailColumns, NewAchievement};
use crate::uploads::UploadSink;
use crate::validation::{non_empty, required};

pub const UNKNOWN_STUDENT: &str = "Student ID does not exist in the system.";
const SUBMITTED_NOTICE: &str = "Achievement submitted successfully!";
const RECENT_LIMIT: i64 = 5;

#[get("/")]
pub fn home() -> Template {
    Template::render(
        "home",
        context! {
            title: "Achievement Tracker",
        },
    )
}

fn render_submission_form(
    teacher: &Identity,
    error: Option<String>,
    success: Option<String>,
) -> Template {
    let categories: Vec<&str> = AchievementCategory::ALL.iter().map(|c| c.label()).collect();

    Template::render(
        "teacher_achievements",
        context! {
            title: "Submit Achievement - Achievement Tracker",
            teacher: teacher,
            categories: categories,
            error: error,
            success: success,
        },
    )
}

#[get("/teacher-achievements")]
pub fn teacher_achievements_form(teacher: TeacherSession) -> Template {
    render_submission_form(&teacher, None, None)
}

#[derive(FromForm)]
pub struct AchievementForm<'r> {
    #[field(default = String::new())]
    student_id: String,
    #[field(default = String::new())]
    achievement_type: String,
    #[field(default = String::new())]
    event_name: String,
    #[field(default = String::new())]
    achievement_date: String,
    #[field(default = String::new())]
    organizer: String,
    #[field(default = String::new())]
    position: String,
    achievement_description: Option<String>,

    symposium_theme: Option<String>,
    programming_language: Option<String>,
    coding_platform: Option<String>,
    paper_title: Option<String>,
    journal_name: Option<String>,
    conference_level: Option<String>,
    conference_role: Option<String>,
    team_size: Option<String>,
    project_title: Option<String>,
    database_type: Option<String>,
    difficulty_level: Option<String>,
    other_description: Option<String>,

    certificate: Option<TempFile<'r>>,
}

/// Blank means no team size; anything else must be a whole number.
pub fn parse_team_size(value: Option<&str>) -> Result<Option<i64>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(|_| {
            AppError::Validation(format!("Team size must be a whole number, got '{}'", v))
        }),
    }
}

impl AchievementForm<'_> {
    /// Checks the required fields and builds the record, minus the
    /// certificate which is stored separately.
    fn to_new_achievement(&self, teacher_id: &str) -> Result<NewAchievement, AppError> {
        let student_id = required("Student ID", &self.student_id)?;
        let achievement_type = required("Achievement type", &self.achievement_type)?;
        let event_name = required("Event name", &self.event_name)?;
        let achievement_date = required("Achievement date", &self.achievement_date)?;
        let organizer = required("Organizer", &self.organizer)?;
        let position = required("Position", &self.position)?;

        if NaiveDate::parse_from_str(&achievement_date, "%Y-%m-%d").is_err() {
            return Err(AppError::Validation(
                "Achievement date must be in YYYY-MM-DD format".to_string(),
            ));
        }

        let team_size = parse_team_size(self.team_size.as_deref())?;

        let details = DetailColumns {
            symposium_theme: non_empty(self.symposium_theme.clone()),
            programming_language: non_empty(self.programming_language.clone()),
            coding_platform: non_empty(self.coding_platform.clone()),
            paper_title: non_empty(self.paper_title.clone()),
            journal_name: non_empty(self.journal_name.clone()),
            conference_level: non_empty(self.conference_level.clone()),
            conference_role: non_empty(self.conference_role.clone()),
            team_size,
            project_title: non_empty(self.project_title.clone()),
            database_type: non_empty(self.database_type.clone()),
            difficulty_level: non_empty(self.difficulty_level.clone()),
            other_description: non_empty(self.other_description.clone()),
        };

        Ok(NewAchievement {
            teacher_id: teacher_id.to_string(),
            student_id,
            achievement_type,
            event_name,
            achievement_date,
            organizer,
            position,
            description: non_empty(self.achievement_description.clone()),
            certificate_path: None,
            details,
        })
    }
}

#[instrument(skip_all, fields(teacher_id = %teacher.id))]
async fn record_achievement(
    db: &Pool<Sqlite>,
    uploads: &UploadSink,
    teacher: &Identity,
    form: &mut AchievementForm<'_>,
) -> Result<String, AppError> {
    let mut achievement = form.to_new_achievement(&teacher.id)?;

    if let Some(file) = form.certificate.as_mut() {
        achievement.certificate_path = uploads.save(file).await?;
    }

    // A certificate saved above stays on disk when the student is unknown
    let Some(student) = db::find_account(db, Role::Student, &achievement.student_id).await? else {
        return Err(AppError::NotFound(UNKNOWN_STUDENT.to_string()));
    };

    let id = db::insert_achievement(db, &achievement).await?;
    info!(achievement_id = id, student_id = %student.id, "Achievement recorded");

    Ok(student.name)
}

#[post("/submit_achievements", data = "<form>")]
pub async fn submit_achievement<'r>(
    teacher: TeacherSession,
    form: Result<Form<AchievementForm<'r>>, Errors<'r>>,
    uploads: &State<UploadSink>,
    db: &State<Pool<Sqlite>>,
) -> Template {
    let mut form = match form {
        Ok(form) => form.into_inner(),
        Err(errors) => {
            let e = AppError::Internal(errors.to_string());
            e.log_and_record("Decoding achievement form");
            return render_submission_form(&teacher, Some(e.user_message()), None);
        }
    };

    match record_achievement(db, uploads, &teacher, &mut form).await {
        Ok(student_name) => render_submission_form(
            &teacher,
            None,
            Some(format!(
                "Achievement of {} has been successfully registered!!",
                student_name
            )),
        ),
        Err(e) => {
            e.log_and_record("Submitting achievement");
            render_submission_form(&teacher, Some(e.user_message()), None)
        }
    }
}

#[get("/submit_achievements")]
pub fn submit_achievement_redirect(_teacher: TeacherSession) -> Redirect {
    Redirect::to(uri!(teacher_dashboard(success = Some(SUBMITTED_NOTICE))))
}

#[get("/teacher-dashboard?<success>")]
pub async fn teacher_dashboard(
    teacher: TeacherSession,
    success: Option<String>,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let since = Local::now().date_naive() - Duration::days(7);

    let stats = db::teacher_dashboard_stats(db, &teacher.id, since)
        .await
        .map_err(|e| e.to_status_with_log("Loading dashboard stats"))?;

    let recent_entries = db::recent_achievements_for_teacher(db, &teacher.id, RECENT_LIMIT)
        .await
        .map_err(|e| e.to_status_with_log("Loading recent achievements"))?;

    Ok(Template::render(
        "teacher_dashboard",
        context! {
            title: "Teacher Dashboard - Achievement Tracker",
            teacher: &*teacher,
            stats: stats,
            recent_entries: recent_entries,
            success: success,
        },
    ))
}

#[get("/all-achievements")]
pub async fn all_achievements(
    teacher: TeacherSession,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let achievements = db::achievements_for_teacher(db, &teacher.id)
        .await
        .map_err(|e| e.to_status_with_log("Loading teacher achievements"))?;

    Ok(Template::render(
        "all_achievements",
        context! {
            title: "All Achievements - Achievement Tracker",
            teacher: &*teacher,
            achievements: achievements,
        },
    ))
}

#[get("/student-dashboard")]
pub async fn student_dashboard(
    student: StudentSession,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let achievements = db::achievements_for_student(db, &student.id)
        .await
        .map_err(|e| e.to_status_with_log("Loading student dashboard"))?;

    let total = achievements.len();
    let recent: Vec<_> = achievements
        .into_iter()
        .take(RECENT_LIMIT as usize)
        .collect();

    Ok(Template::render(
        "student_dashboard",
        context! {
            title: "Student Dashboard - Achievement Tracker",
            student: &*student,
            total_achievements: total,
            recent_entries: recent,
        },
    ))
}

#[get("/student-achievements")]
pub async fn student_achievements(
    student: StudentSession,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let achievements = db::achievements_for_student(db, &student.id)
        .await
        .map_err(|e| e.to_status_with_log("Loading student achievements"))?;

    Ok(Template::render(
        "student_achievements",
        context! {
            title: "My Achievements - Achievement Tracker",
            student: &*student,
            achievements: achievements,
        },
    ))
}
