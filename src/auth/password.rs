//! Password rules and bcrypt hashing for user accounts.

use std::fmt::Display;

use bcrypt::BcryptError;
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// Passwords shorter than this are rejected before the strength estimate runs.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// A plain-text password that passed the strength rules and may be hashed.
///
/// The wrapped string is never printed, see the [Display] impl.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check `raw_password` for a new account or a password reset.
    ///
    /// `account_details` (e.g. the username and email) count against the
    /// password's strength, so "alice2024!" is weak for the user "alice".
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with a hint for the user when the password is
    /// shorter than [PASSWORD_MIN_LENGTH] or zxcvbn scores it below three.
    pub fn new(raw_password: &str, account_details: &[&str]) -> Result<Self, Error> {
        if raw_password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(Error::TooWeak(format!(
                "use at least {PASSWORD_MIN_LENGTH} characters"
            )));
        }

        let estimate = zxcvbn(raw_password, account_details);
        if matches!(estimate.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let hint = estimate
            .feedback()
            .map(|feedback| feedback.to_string())
            .filter(|hint| !hint.trim().is_empty())
            .unwrap_or_else(|| "add another word or two, uncommon words are better".to_owned());

        Err(Error::TooWeak(hint))
    }

    /// Skip the strength rules, for seeding demo data and tests.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash as stored in the `user.password` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// bcrypt's recommended work factor.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with a fresh salt.
    ///
    /// Tests pass a low `cost` (e.g. 4) to keep them fast.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails, e.g. for an out of range cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(raw_password, &self.0)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod password_hash_tests {
    use crate::{
        Error,
        auth::{PasswordHash, ValidatedPassword},
    };

    #[test]
    fn verifies_known_hash() {
        let hash = PasswordHash::new_unchecked(
            "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm",
        );

        assert!(hash.verify("okon").unwrap());
        assert!(!hash.verify("thewrongpassword").unwrap());
    }

    #[test]
    fn new_hash_verifies_original_password() {
        let password = ValidatedPassword::new_unchecked("roostersgocockledoodledoo");

        let hash = PasswordHash::new(password, 4).unwrap();

        assert!(hash.verify("roostersgocockledoodledoo").unwrap());
        assert!(!hash.verify("the_wrong_password").unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let password = ValidatedPassword::new_unchecked("turkeysgogobblegobble");

        let hash = PasswordHash::new(password.clone(), 4).unwrap();
        let other_hash = PasswordHash::new(password, 4).unwrap();

        assert_ne!(hash, other_hash);
    }

    #[test]
    fn invalid_cost_is_a_hashing_error() {
        let password = ValidatedPassword::new_unchecked("turkeysgogobblegobble");

        let result = PasswordHash::new(password, 99);

        assert!(matches!(result, Err(Error::HashingError(_))));
    }
}
