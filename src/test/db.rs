#[cfg(test)]
mod tests {
    use crate::auth::Role;
    use crate::db::{
        achievements_for_student, achievements_for_teacher, authenticate, create_account,
        find_account, insert_achievement, recent_achievements_for_teacher,
        teacher_dashboard_stats,
    };
    use crate::error::AppError;
    use crate::models::{AchievementDetails, DetailColumns, NewAccount, NewAchievement};
    use crate::test::test_utils::{STANDARD_PASSWORD, TestDbBuilder, create_standard_test_db};
    use chrono::{Duration, Local, NaiveDate};
    use rocket::tokio;

    fn hackathon(teacher_id: &str, student_id: &str, event_name: &str) -> NewAchievement {
        NewAchievement {
            teacher_id: teacher_id.to_string(),
            student_id: student_id.to_string(),
            achievement_type: "Hackathon".to_string(),
            event_name: event_name.to_string(),
            achievement_date: "2024-03-15".to_string(),
            organizer: "IEEE".to_string(),
            position: "Runner-up".to_string(),
            description: Some("Built a campus map".to_string()),
            certificate_path: None,
            details: DetailColumns {
                project_title: Some("Campus Map".to_string()),
                team_size: Some(4),
                ..DetailColumns::default()
            },
        }
    }

    #[tokio::test]
    async fn test_find_account() {
        let test_db = create_standard_test_db().await;

        let account = find_account(&test_db.pool, Role::Student, "S1")
            .await
            .expect("Lookup failed")
            .expect("Student should exist");

        assert_eq!(account.id, "S1");
        assert_eq!(account.name, "Student One");
        assert_eq!(account.role, Role::Student);
        assert_eq!(account.dept.as_deref(), Some("CSE"));

        // Student ids are not teacher ids
        let missing = find_account(&test_db.pool, Role::Teacher, "S1")
            .await
            .expect("Lookup failed");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_account_rejects_duplicates() {
        let test_db = create_standard_test_db().await;

        let duplicate = NewAccount {
            id: "S1".to_string(),
            name: "Someone Else".to_string(),
            email: "other@example.edu".to_string(),
            phone_number: None,
            password: "secret".to_string(),
            gender: None,
            dept: None,
        };

        match create_account(&test_db.pool, Role::Student, &duplicate).await {
            Err(AppError::Validation(msg)) => assert!(msg.contains("already exists")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_passwords_are_hashed() {
        let test_db = create_standard_test_db().await;

        let (stored,): (String,) =
            sqlx::query_as("SELECT password FROM teacher WHERE teacher_id = 'T1'")
                .fetch_one(&test_db.pool)
                .await
                .unwrap();

        assert_ne!(stored, STANDARD_PASSWORD);
        assert!(stored.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_authenticate_success_matches_stored_row() {
        let test_db = create_standard_test_db().await;

        let account = authenticate(&test_db.pool, Role::Teacher, "T1", STANDARD_PASSWORD)
            .await
            .expect("Authentication errored")
            .expect("Credentials should match");

        assert_eq!(account.id, "T1");
        assert_eq!(account.name, "Teacher One");
        assert_eq!(account.email, "t1@example.edu");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_id_fail_alike() {
        let test_db = create_standard_test_db().await;

        let wrong_password = authenticate(&test_db.pool, Role::Teacher, "T1", "nope")
            .await
            .expect("Authentication errored");
        let unknown_id = authenticate(&test_db.pool, Role::Teacher, "T404", "nope")
            .await
            .expect("Authentication errored");

        assert!(wrong_password.is_none());
        assert!(unknown_id.is_none());
    }

    #[tokio::test]
    async fn test_legacy_plaintext_password_upgraded() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        sqlx::query(
            "INSERT INTO student (student_name, student_id, email, password)
             VALUES ('Legacy', 'L1', 'l1@example.edu', 'plain')",
        )
        .execute(&test_db.pool)
        .await
        .unwrap();

        let account = authenticate(&test_db.pool, Role::Student, "L1", "plain")
            .await
            .expect("Authentication errored");
        assert!(account.is_some());

        let (stored,): (String,) =
            sqlx::query_as("SELECT password FROM student WHERE student_id = 'L1'")
                .fetch_one(&test_db.pool)
                .await
                .unwrap();
        assert!(stored.starts_with("$2"), "Password should now be hashed");

        let again = authenticate(&test_db.pool, Role::Student, "L1", "plain")
            .await
            .expect("Authentication errored");
        assert!(again.is_some());
    }

    #[tokio::test]
    async fn test_inserted_achievement_returned_once() {
        let test_db = create_standard_test_db().await;

        let id = insert_achievement(&test_db.pool, &hackathon("T1", "S1", "HackFest"))
            .await
            .expect("Insert failed");

        let achievements = achievements_for_teacher(&test_db.pool, "T1")
            .await
            .expect("Query failed");

        let matching: Vec<_> = achievements.iter().filter(|a| a.id == id).collect();
        assert_eq!(matching.len(), 1);

        let achievement = matching[0];
        assert_eq!(achievement.student_name, "Student One");
        assert_eq!(achievement.description.as_deref(), Some("Built a campus map"));
        assert_eq!(
            achievement.details,
            AchievementDetails::Hackathon {
                project_title: Some("Campus Map".to_string()),
                team_size: Some(4),
            }
        );
        assert!(achievement.created_at.is_some());

        let other_teacher = achievements_for_teacher(&test_db.pool, "T2")
            .await
            .expect("Query failed");
        assert!(other_teacher.is_empty());
    }

    #[tokio::test]
    async fn test_created_at_non_decreasing() {
        let test_db = create_standard_test_db().await;

        for i in 0..3 {
            insert_achievement(&test_db.pool, &hackathon("T1", "S1", &format!("Hack {}", i)))
                .await
                .expect("Insert failed");
        }

        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, created_at FROM achievements ORDER BY id")
                .fetch_all(&test_db.pool)
                .await
                .unwrap();

        assert_eq!(rows.len(), 3);
        for pair in rows.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "created_at went backwards");
        }
    }

    #[tokio::test]
    async fn test_all_submitted_detail_columns_persisted() {
        let test_db = create_standard_test_db().await;

        let mut achievement = hackathon("T1", "S1", "HackFest");
        achievement.achievement_type = "Symposium".to_string();
        achievement.details.symposium_theme = Some("Green Computing".to_string());
        achievement.details.programming_language = Some("Rust".to_string());
        insert_achievement(&test_db.pool, &achievement)
            .await
            .expect("Insert failed");

        let (theme, team_size, project_title, language): (
            Option<String>,
            Option<i64>,
            Option<String>,
            Option<String>,
        ) = sqlx::query_as(
            "SELECT symposium_theme, team_size, project_title, programming_language FROM achievements",
        )
        .fetch_one(&test_db.pool)
        .await
        .unwrap();

        assert_eq!(theme.as_deref(), Some("Green Computing"));
        assert_eq!(team_size, Some(4));
        assert_eq!(project_title.as_deref(), Some("Campus Map"));
        assert_eq!(language.as_deref(), Some("Rust"));

        let stored = achievements_for_teacher(&test_db.pool, "T1")
            .await
            .expect("Query failed");
        assert_eq!(
            stored[0].details,
            AchievementDetails::Symposium {
                theme: Some("Green Computing".to_string()),
            }
        );
        assert_eq!(stored[0].columns, achievement.details);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let today = Local::now().date_naive();
        let recent = (today - Duration::days(2)).format("%Y-%m-%d").to_string();

        let test_db = TestDbBuilder::new()
            .teacher("T1", "Teacher One")
            .teacher("T2", "Teacher Two")
            .student("S1", "Student One")
            .student("S2", "Student Two")
            .achievement("T1", "S1", "Hackathon", "Recent Hack", &recent)
            .achievement("T1", "S1", "Symposium", "Old Symposium", "2020-01-10")
            .achievement("T1", "S2", "Project", "Old Project", "2021-06-01")
            .achievement("T2", "S2", "Conference", "Other Teacher", &recent)
            .build()
            .await
            .unwrap();

        let stats = teacher_dashboard_stats(&test_db.pool, "T1", today - Duration::days(7))
            .await
            .expect("Stats failed");

        assert_eq!(stats.total_achievements, 3);
        assert_eq!(stats.students_managed, 2);
        assert_eq!(stats.this_week, 1);

        let empty = teacher_dashboard_stats(
            &test_db.pool,
            "T404",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .await
        .expect("Stats failed");
        assert_eq!(empty.total_achievements, 0);
        assert_eq!(empty.students_managed, 0);
    }

    #[tokio::test]
    async fn test_recent_achievements_newest_first() {
        let mut builder = TestDbBuilder::new()
            .teacher("T1", "Teacher One")
            .student("S1", "Student One");
        for i in 0..7 {
            builder = builder.achievement("T1", "S1", "Hackathon", &format!("Hack {}", i), "2024-01-01");
        }
        let test_db = builder.build().await.unwrap();

        let recent = recent_achievements_for_teacher(&test_db.pool, "T1", 5)
            .await
            .expect("Query failed");

        assert_eq!(recent.len(), 5);
        // Same-second timestamps fall back to insertion order
        let names: Vec<&str> = recent.iter().map(|a| a.event_name.as_str()).collect();
        assert_eq!(names, vec!["Hack 6", "Hack 5", "Hack 4", "Hack 3", "Hack 2"]);
    }

    #[tokio::test]
    async fn test_achievements_for_student_ordered_by_date() {
        let test_db = TestDbBuilder::new()
            .teacher("T1", "Teacher One")
            .teacher("T2", "Teacher Two")
            .student("S1", "Student One")
            .student("S2", "Student Two")
            .achievement("T1", "S1", "Hackathon", "Early", "2023-01-01")
            .achievement("T2", "S1", "Conference", "Late", "2024-05-05")
            .achievement("T1", "S2", "Project", "Not Mine", "2024-06-06")
            .build()
            .await
            .unwrap();

        let achievements = achievements_for_student(&test_db.pool, "S1")
            .await
            .expect("Query failed");

        let names: Vec<&str> = achievements.iter().map(|a| a.event_name.as_str()).collect();
        assert_eq!(names, vec!["Late", "Early"]);
    }
}
