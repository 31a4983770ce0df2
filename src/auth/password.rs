use crate::error::AppError;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Matched a plaintext password written before hashing was introduced.
    /// The caller should store a fresh hash.
    ValidLegacy,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, HASH_COST)?)
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.len() == 60 && stored.starts_with("$2")
}

pub fn check_password(supplied: &str, stored: &str) -> PasswordCheck {
    if is_bcrypt_hash(stored) {
        return match bcrypt::verify(supplied, stored) {
            Ok(true) => PasswordCheck::Valid,
            _ => PasswordCheck::Invalid,
        };
    }

    if !stored.is_empty() && supplied == stored {
        PasswordCheck::ValidLegacy
    } else {
        PasswordCheck::Invalid
    }
}
