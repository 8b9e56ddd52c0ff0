use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::{HelpdeskError, Secret};

pub fn hash_password(password: &Secret<String>) -> Result<String, HelpdeskError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)?
        .to_string())
}

pub fn parse_hash(hash: &str) -> Result<PasswordHash<'_>, Error> {
    PasswordHash::new(hash)
}

/// `Ok(false)` for a wrong password, `Err` for a malformed stored hash.
pub fn verify_password_hash(password: &Secret<String>, hash: &str) -> Result<bool, HelpdeskError> {
    let parsed_hash = parse_hash(hash)?;
    match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() -> Result<(), HelpdeskError> {
        let password = Secret::new("correct horse".to_owned());
        let hash = hash_password(&password)?;
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password_hash(&password, &hash)?);
        assert!(!verify_password_hash(&Secret::new("wrong".to_owned()), &hash)?);
        Ok(())
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let password = Secret::new("x".to_owned());
        assert!(verify_password_hash(&password, "plaintext").is_err());
    }
}
