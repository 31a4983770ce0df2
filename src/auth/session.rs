use rocket::Request;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::Redirect;
use serde::Serialize;
use std::ops::Deref;

use crate::models::Account;

use super::Role;

const ID_COOKIE: &str = "logged_in";
const ROLE_COOKIE: &str = "user_role";
const NAME_COOKIE: &str = "display_name";
const DEPT_COOKIE: &str = "user_dept";

/// Who is logged in, as recorded in the private session cookies at login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub role: Role,
    pub id: String,
    pub name: String,
    pub dept: Option<String>,
}

impl Identity {
    pub fn from_account(account: &Account) -> Self {
        Self {
            role: account.role,
            id: account.id.clone(),
            name: account.name.clone(),
            dept: account.dept.clone(),
        }
    }

    /// Browser-session cookies: no `Max-Age` or `Expires`.
    pub fn store(&self, cookies: &CookieJar<'_>) {
        let entries = [
            (ID_COOKIE, self.id.clone()),
            (ROLE_COOKIE, self.role.to_string()),
            (NAME_COOKIE, self.name.clone()),
            (DEPT_COOKIE, self.dept.clone().unwrap_or_default()),
        ];

        for (name, value) in entries {
            cookies.add_private(
                Cookie::build((name, value))
                    .same_site(SameSite::Lax)
                    .http_only(true)
                    .expires(None::<rocket::time::OffsetDateTime>),
            );
        }
    }

    pub fn load(cookies: &CookieJar<'_>) -> Option<Self> {
        let id = cookies.get_private(ID_COOKIE)?.value().to_string();
        let role = Role::from_str(cookies.get_private(ROLE_COOKIE)?.value()).ok()?;
        let name = cookies
            .get_private(NAME_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default();
        let dept = cookies
            .get_private(DEPT_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|d| !d.is_empty());

        Some(Self {
            role,
            id,
            name,
            dept,
        })
    }

    pub fn clear(cookies: &CookieJar<'_>) {
        for name in [ID_COOKIE, ROLE_COOKIE, NAME_COOKIE, DEPT_COOKIE] {
            cookies.remove_private(Cookie::build(name));
        }
    }
}

fn session_for(request: &Request<'_>, role: Role) -> Outcome<Identity, ()> {
    let auth_span = tracing::info_span!("session_guard", role = %role);
    let _guard = auth_span.enter();

    match Identity::load(request.cookies()) {
        Some(identity) if identity.role == role => {
            tracing::debug!(id = %identity.id, "Session identity resolved");
            Outcome::Success(identity)
        }
        Some(identity) => {
            tracing::warn!(
                id = %identity.id,
                actual_role = %identity.role,
                "Session belongs to a different role"
            );
            Outcome::Error((Status::Unauthorized, ()))
        }
        None => Outcome::Error((Status::Unauthorized, ())),
    }
}

/// A logged-in teacher. Routes taking this guard redirect to the teacher
/// login page otherwise.
#[derive(Debug, Clone)]
pub struct TeacherSession(pub Identity);

/// A logged-in student.
#[derive(Debug, Clone)]
pub struct StudentSession(pub Identity);

impl Deref for TeacherSession {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for StudentSession {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for TeacherSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        session_for(request, Role::Teacher).map(TeacherSession)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StudentSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        session_for(request, Role::Student).map(StudentSession)
    }
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> Redirect {
    tracing::warn!(uri = %req.uri(), "Unauthorized access attempt");

    if req.uri().path().as_str().starts_with("/student") {
        Redirect::to(Role::Student.login_path())
    } else {
        Redirect::to(Role::Teacher.login_path())
    }
}
