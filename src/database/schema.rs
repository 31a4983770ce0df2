pub const CURRENT_SCHEMA: &str = r#"
PRAGMA user_version = 1;

CREATE TABLE IF NOT EXISTS student (
    student_name TEXT NOT NULL,
    student_id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    phone_number TEXT,
    password TEXT NOT NULL,
    student_gender TEXT,
    student_dept TEXT
);

CREATE TABLE IF NOT EXISTS teacher (
    teacher_name TEXT NOT NULL,
    teacher_id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    phone_number TEXT,
    password TEXT NOT NULL,
    teacher_gender TEXT,
    teacher_dept TEXT
);

CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    teacher_id TEXT NOT NULL DEFAULT 'unknown',
    student_id TEXT NOT NULL,
    achievement_type TEXT NOT NULL,
    event_name TEXT NOT NULL,
    achievement_date DATE NOT NULL,
    organizer TEXT NOT NULL,
    position TEXT NOT NULL,
    achievement_description TEXT,
    certificate_path TEXT,

    symposium_theme TEXT,
    programming_language TEXT,
    coding_platform TEXT,
    paper_title TEXT,
    journal_name TEXT,
    conference_level TEXT,
    conference_role TEXT,
    team_size INTEGER,
    project_title TEXT,
    database_type TEXT,
    difficulty_level TEXT,
    other_description TEXT,

    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (student_id) REFERENCES student (student_id),
    FOREIGN KEY (teacher_id) REFERENCES teacher (teacher_id)
);

CREATE INDEX IF NOT EXISTS idx_achievements_teacher ON achievements (teacher_id);
CREATE INDEX IF NOT EXISTS idx_achievements_student ON achievements (student_id);
"#;
