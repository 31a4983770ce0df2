use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::auth::Role;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Account {
    pub role: Role,
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub dept: Option<String>,
}

/// Row shape shared by the student and teacher tables once their
/// role-prefixed columns are aliased.
#[derive(sqlx::FromRow, Clone)]
pub struct DbAccount {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub dept: Option<String>,
}

impl DbAccount {
    pub fn into_account(self, role: Role) -> Account {
        Account {
            role,
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone_number: self.phone_number,
            gender: self.gender,
            dept: self.dept,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub gender: Option<String>,
    pub dept: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AchievementCategory {
    Symposium,
    Hackathon,
    CodingContest,
    PaperPresentation,
    Conference,
    Project,
    Other,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 7] = [
        AchievementCategory::Symposium,
        AchievementCategory::Hackathon,
        AchievementCategory::CodingContest,
        AchievementCategory::PaperPresentation,
        AchievementCategory::Conference,
        AchievementCategory::Project,
        AchievementCategory::Other,
    ];

    /// Maps the free-text `achievement_type` onto a category. Case, spacing
    /// and punctuation are ignored; anything unrecognised is `Other`.
    pub fn from_type(achievement_type: &str) -> Self {
        let key: String = achievement_type
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "symposium" => AchievementCategory::Symposium,
            "hackathon" => AchievementCategory::Hackathon,
            "coding" | "codingcontest" | "codingcompetition" | "competitiveprogramming" => {
                AchievementCategory::CodingContest
            }
            "paper" | "paperpresentation" | "journal" | "publication" | "journalpublication" => {
                AchievementCategory::PaperPresentation
            }
            "conference" => AchievementCategory::Conference,
            "project" | "projectcompetition" | "projectexpo" => AchievementCategory::Project,
            _ => AchievementCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AchievementCategory::Symposium => "Symposium",
            AchievementCategory::Hackathon => "Hackathon",
            AchievementCategory::CodingContest => "Coding Contest",
            AchievementCategory::PaperPresentation => "Paper Presentation",
            AchievementCategory::Conference => "Conference",
            AchievementCategory::Project => "Project",
            AchievementCategory::Other => "Other",
        }
    }
}

/// Category-specific part of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category")]
pub enum AchievementDetails {
    Symposium {
        theme: Option<String>,
    },
    Hackathon {
        project_title: Option<String>,
        team_size: Option<i64>,
    },
    CodingContest {
        programming_language: Option<String>,
        coding_platform: Option<String>,
        difficulty_level: Option<String>,
    },
    PaperPresentation {
        paper_title: Option<String>,
        journal_name: Option<String>,
    },
    Conference {
        conference_level: Option<String>,
        conference_role: Option<String>,
        paper_title: Option<String>,
    },
    Project {
        project_title: Option<String>,
        team_size: Option<i64>,
        database_type: Option<String>,
    },
    Other {
        description: Option<String>,
    },
}

/// The flat per-category columns of the `achievements` table. Everything
/// submitted is stored here, whatever the category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailColumns {
    pub symposium_theme: Option<String>,
    pub programming_language: Option<String>,
    pub coding_platform: Option<String>,
    pub paper_title: Option<String>,
    pub journal_name: Option<String>,
    pub conference_level: Option<String>,
    pub conference_role: Option<String>,
    pub team_size: Option<i64>,
    pub project_title: Option<String>,
    pub database_type: Option<String>,
    pub difficulty_level: Option<String>,
    pub other_description: Option<String>,
}

impl AchievementDetails {
    /// The view of `columns` relevant to `category`.
    pub fn from_columns(category: AchievementCategory, columns: DetailColumns) -> Self {
        match category {
            AchievementCategory::Symposium => AchievementDetails::Symposium {
                theme: columns.symposium_theme,
            },
            AchievementCategory::Hackathon => AchievementDetails::Hackathon {
                project_title: columns.project_title,
                team_size: columns.team_size,
            },
            AchievementCategory::CodingContest => AchievementDetails::CodingContest {
                programming_language: columns.programming_language,
                coding_platform: columns.coding_platform,
                difficulty_level: columns.difficulty_level,
            },
            AchievementCategory::PaperPresentation => AchievementDetails::PaperPresentation {
                paper_title: columns.paper_title,
                journal_name: columns.journal_name,
            },
            AchievementCategory::Conference => AchievementDetails::Conference {
                conference_level: columns.conference_level,
                conference_role: columns.conference_role,
                paper_title: columns.paper_title,
            },
            AchievementCategory::Project => AchievementDetails::Project {
                project_title: columns.project_title,
                team_size: columns.team_size,
                database_type: columns.database_type,
            },
            AchievementCategory::Other => AchievementDetails::Other {
                description: columns.other_description,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAchievement {
    pub teacher_id: String,
    pub student_id: String,
    pub achievement_type: String,
    pub event_name: String,
    pub achievement_date: String,
    pub organizer: String,
    pub position: String,
    pub description: Option<String>,
    pub certificate_path: Option<String>,
    pub details: DetailColumns,
}

#[derive(Debug, Serialize, Clone)]
pub struct Achievement {
    pub id: i64,
    pub teacher_id: String,
    pub student_id: String,
    pub student_name: String, // From the join on student
    pub achievement_type: String,
    pub event_name: String,
    pub achievement_date: String,
    pub organizer: String,
    pub position: String,
    pub description: Option<String>,
    pub certificate_path: Option<String>,
    pub details: AchievementDetails,
    pub columns: DetailColumns,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbAchievement {
    pub id: Option<i64>,
    pub teacher_id: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub achievement_type: Option<String>,
    pub event_name: Option<String>,
    pub achievement_date: Option<String>,
    pub organizer: Option<String>,
    pub position: Option<String>,
    pub achievement_description: Option<String>,
    pub certificate_path: Option<String>,
    pub symposium_theme: Option<String>,
    pub programming_language: Option<String>,
    pub coding_platform: Option<String>,
    pub paper_title: Option<String>,
    pub journal_name: Option<String>,
    pub conference_level: Option<String>,
    pub conference_role: Option<String>,
    pub team_size: Option<i64>,
    pub project_title: Option<String>,
    pub database_type: Option<String>,
    pub difficulty_level: Option<String>,
    pub other_description: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbAchievement> for Achievement {
    fn from(db: DbAchievement) -> Self {
        let achievement_type = db.achievement_type.unwrap_or_default();
        let category = AchievementCategory::from_type(&achievement_type);
        let columns = DetailColumns {
            symposium_theme: db.symposium_theme,
            programming_language: db.programming_language,
            coding_platform: db.coding_platform,
            paper_title: db.paper_title,
            journal_name: db.journal_name,
            conference_level: db.conference_level,
            conference_role: db.conference_role,
            team_size: db.team_size,
            project_title: db.project_title,
            database_type: db.database_type,
            difficulty_level: db.difficulty_level,
            other_description: db.other_description,
        };

        Self {
            id: db.id.unwrap_or_default(),
            teacher_id: db.teacher_id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            student_name: db.student_name.unwrap_or_default(),
            achievement_type,
            event_name: db.event_name.unwrap_or_default(),
            achievement_date: db.achievement_date.unwrap_or_default(),
            organizer: db.organizer.unwrap_or_default(),
            position: db.position.unwrap_or_default(),
            description: db.achievement_description,
            certificate_path: db.certificate_path,
            details: AchievementDetails::from_columns(category, columns.clone()),
            columns,
            created_at: db
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_achievements: i64,
    pub students_managed: i64,
    pub this_week: i64,
}
