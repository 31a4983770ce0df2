#[cfg(test)]
mod tests {
    use crate::auth::{PasswordCheck, Role, check_password, hash_password};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").expect("Hashing failed");

        assert_ne!(hash, "correct horse");
        assert_eq!(check_password("correct horse", &hash), PasswordCheck::Valid);
        assert_eq!(check_password("wrong horse", &hash), PasswordCheck::Invalid);
    }

    #[test]
    fn test_legacy_plaintext() {
        assert_eq!(check_password("q", "q"), PasswordCheck::ValidLegacy);
        assert_eq!(check_password("Q", "q"), PasswordCheck::Invalid);
        assert_eq!(check_password("", ""), PasswordCheck::Invalid);
    }

    #[test]
    fn test_role_paths() {
        assert_eq!(Role::from_str("teacher").unwrap(), Role::Teacher);
        assert!(Role::from_str("admin").is_err());
        assert_eq!(Role::Student.login_path(), "/student");
        assert_eq!(Role::Teacher.dashboard_path(), "/teacher-dashboard");
        assert_eq!(Role::Teacher.table(), "teacher");
    }
}
