use rocket::State;
use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::info;
use validator::Validate;

use crate::db;
use crate::error::AppError;
use crate::models::NewAccount;
use crate::validation::{FormValidateExt, non_empty};

use super::{Identity, Role};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

pub struct Credentials {
    id: String,
    password: String,
}

#[derive(FromForm)]
pub struct StudentLoginForm {
    #[field(name = "student_id")]
    #[field(name = "sname")]
    #[field(default = String::new())]
    student_id: String,
    #[field(default = String::new())]
    password: String,
}

impl From<StudentLoginForm> for Credentials {
    fn from(form: StudentLoginForm) -> Self {
        Self {
            id: form.student_id,
            password: form.password,
        }
    }
}

#[derive(FromForm)]
pub struct TeacherLoginForm {
    #[field(name = "teacher_id")]
    #[field(name = "tname")]
    #[field(default = String::new())]
    teacher_id: String,
    #[field(default = String::new())]
    password: String,
}

impl From<TeacherLoginForm> for Credentials {
    fn from(form: TeacherLoginForm) -> Self {
        Self {
            id: form.teacher_id,
            password: form.password,
        }
    }
}

fn render_login(role: Role, id: Option<&str>, error: Option<String>) -> Template {
    let heading = match role {
        Role::Student => "Student Login",
        Role::Teacher => "Teacher Login",
    };

    Template::render(
        "login",
        context! {
            title: format!("{} - Achievement Tracker", heading),
            heading: heading,
            role: role.as_str(),
            action: role.login_path(),
            id_field: format!("{}_id", role.as_str()),
            register_path: format!("{}-new", role.login_path()),
            id: id.unwrap_or_default(),
            error: error,
        },
    )
}

async fn login(
    db: &Pool<Sqlite>,
    cookies: &CookieJar<'_>,
    role: Role,
    form: Credentials,
) -> Result<Redirect, Template> {
    info!(role = %role, id = %form.id, "Login attempt");

    match db::authenticate(db, role, &form.id, &form.password).await {
        Ok(Some(account)) => {
            info!(role = %role, id = %account.id, "Authentication successful");
            Identity::from_account(&account).store(cookies);
            Ok(Redirect::to(role.dashboard_path()))
        }
        Ok(None) => {
            let e = AppError::Authentication(INVALID_CREDENTIALS.to_string());
            e.log_and_record(&format!("{} login for {}", role, form.id));
            Err(render_login(role, Some(&form.id), Some(e.user_message())))
        }
        Err(e) => {
            e.log_and_record("Login");
            Err(render_login(role, Some(&form.id), Some(e.user_message())))
        }
    }
}

#[get("/student")]
pub fn student_login() -> Template {
    render_login(Role::Student, None, None)
}

#[post("/student", data = "<form>")]
pub async fn process_student_login(
    form: Form<StudentLoginForm>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    login(db, cookies, Role::Student, form.into_inner().into()).await
}

#[get("/teacher")]
pub fn teacher_login() -> Template {
    render_login(Role::Teacher, None, None)
}

#[post("/teacher", data = "<form>")]
pub async fn process_teacher_login(
    form: Form<TeacherLoginForm>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    login(db, cookies, Role::Teacher, form.into_inner().into()).await
}

#[get("/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Redirect {
    Identity::clear(cookies);
    Redirect::to("/")
}

/// Registration fields once the role prefix is stripped.
#[derive(Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(length(min = 1, message = "ID is required"))]
    id: String,
    #[validate(email(message = "Enter a valid email address"))]
    email: String,
    phone_number: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
    gender: Option<String>,
    dept: Option<String>,
}

#[derive(FromForm)]
pub struct StudentRegistrationForm {
    #[field(default = String::new())]
    student_name: String,
    #[field(default = String::new())]
    student_id: String,
    #[field(default = String::new())]
    email: String,
    phone_number: Option<String>,
    #[field(default = String::new())]
    password: String,
    student_gender: Option<String>,
    student_dept: Option<String>,
}

impl From<StudentRegistrationForm> for RegistrationForm {
    fn from(form: StudentRegistrationForm) -> Self {
        Self {
            name: form.student_name,
            id: form.student_id,
            email: form.email,
            phone_number: form.phone_number,
            password: form.password,
            gender: form.student_gender,
            dept: form.student_dept,
        }
    }
}

#[derive(FromForm)]
pub struct TeacherRegistrationForm {
    #[field(default = String::new())]
    teacher_name: String,
    #[field(default = String::new())]
    teacher_id: String,
    #[field(default = String::new())]
    email: String,
    phone_number: Option<String>,
    #[field(default = String::new())]
    password: String,
    teacher_gender: Option<String>,
    teacher_dept: Option<String>,
}

impl From<TeacherRegistrationForm> for RegistrationForm {
    fn from(form: TeacherRegistrationForm) -> Self {
        Self {
            name: form.teacher_name,
            id: form.teacher_id,
            email: form.email,
            phone_number: form.phone_number,
            password: form.password,
            gender: form.teacher_gender,
            dept: form.teacher_dept,
        }
    }
}

impl RegistrationForm {
    fn into_new_account(self) -> NewAccount {
        NewAccount {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: non_empty(self.phone_number),
            password: self.password,
            gender: non_empty(self.gender),
            dept: non_empty(self.dept),
        }
    }
}

fn render_registration(role: Role, error: Option<String>) -> Template {
    let heading = match role {
        Role::Student => "Student Registration",
        Role::Teacher => "Teacher Registration",
    };

    Template::render(
        "register",
        context! {
            title: format!("{} - Achievement Tracker", heading),
            heading: heading,
            role: role.as_str(),
            action: format!("{}-new", role.login_path()),
            prefix: role.as_str(),
            login_path: role.login_path(),
            error: error,
        },
    )
}

async fn register(
    db: &Pool<Sqlite>,
    role: Role,
    form: RegistrationForm,
) -> Result<Redirect, Template> {
    info!(role = %role, id = %form.id, "Registration attempt");

    let result: Result<(), AppError> = async {
        form.validate_form()?;
        db::create_account(db, role, &form.into_new_account()).await
    }
    .await;

    match result {
        Ok(()) => Ok(Redirect::to(role.login_path())),
        Err(e) => {
            e.log_and_record("Registration");
            Err(render_registration(role, Some(e.user_message())))
        }
    }
}

#[get("/student-new")]
pub fn student_register() -> Template {
    render_registration(Role::Student, None)
}

#[post("/student-new", data = "<form>")]
pub async fn process_student_register(
    form: Form<StudentRegistrationForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    register(db, Role::Student, form.into_inner().into()).await
}

#[get("/teacher-new")]
pub fn teacher_register() -> Template {
    render_registration(Role::Teacher, None)
}

#[post("/teacher-new", data = "<form>")]
pub async fn process_teacher_register(
    form: Form<TeacherRegistrationForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    register(db, Role::Teacher, form.into_inner().into()).await
}
