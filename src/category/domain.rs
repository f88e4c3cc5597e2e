//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The color given to categories created without one.
pub const DEFAULT_COLOR: &str = "#007bff";

const NAME_MIN_LENGTH: usize = 2;
const NAME_MAX_LENGTH: usize = 100;
const DESCRIPTION_MAX_LENGTH: usize = 200;

/// A validated category name of 2 to 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCategoryName] if the trimmed name is too short or too long.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        let length = name.chars().count();

        if (NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
            Ok(Self(name.to_owned()))
        } else {
            Err(Error::InvalidCategoryName)
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the name is between 2 and 100 characters.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that `color` is a hex color of the form `#RRGGBB`.
///
/// An empty string is replaced with [DEFAULT_COLOR].
///
/// # Errors
///
/// Returns [Error::InvalidColor] for anything else.
pub fn validate_color(color: &str) -> Result<String, Error> {
    let color = color.trim();

    if color.is_empty() {
        return Ok(DEFAULT_COLOR.to_owned());
    }

    match color.strip_prefix('#') {
        Some(hex) if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            Ok(color.to_owned())
        }
        _ => Err(Error::InvalidColor(color.to_owned())),
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A label for grouping transactions, e.g. 'Food' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub description: Option<String>,
    /// A hex color of the form `#RRGGBB`.
    pub color: String,
    pub created_at: OffsetDateTime,
}

/// A category that has passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub description: Option<String>,
    pub color: String,
}

/// Form data for category creation and editing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
}

impl CategoryFormData {
    /// Validate the form fields.
    ///
    /// A blank description is stored as no description.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found, checking the name, then the
    /// description, then the color.
    pub fn validate(&self) -> Result<NewCategory, Error> {
        let name = CategoryName::new(&self.name)?;

        let description = self.description.trim();
        if description.chars().count() > DESCRIPTION_MAX_LENGTH {
            return Err(Error::CategoryDescriptionTooLong);
        }
        let description = (!description.is_empty()).then(|| description.to_owned());

        let color = validate_color(&self.color)?;

        Ok(NewCategory {
            name,
            description,
            color,
        })
    }
}

#[cfg(test)]
mod category_domain_tests {
    use crate::Error;

    use super::{CategoryFormData, CategoryName, DEFAULT_COLOR, validate_color};

    #[test]
    fn name_is_trimmed_and_length_checked() {
        assert_eq!(
            CategoryName::new("  Food "),
            Ok(CategoryName::new_unchecked("Food"))
        );
        assert_eq!(CategoryName::new(" F "), Err(Error::InvalidCategoryName));
        assert_eq!(
            CategoryName::new(&"a".repeat(101)),
            Err(Error::InvalidCategoryName)
        );
    }

    #[test]
    fn color_must_be_six_hex_digits() {
        assert_eq!(validate_color("#A1b2C3"), Ok("#A1b2C3".to_owned()));
        assert_eq!(validate_color(""), Ok(DEFAULT_COLOR.to_owned()));
        assert_eq!(
            validate_color("#fff"),
            Err(Error::InvalidColor("#fff".to_owned()))
        );
        assert_eq!(
            validate_color("123456"),
            Err(Error::InvalidColor("123456".to_owned()))
        );
        assert_eq!(
            validate_color("#12345g"),
            Err(Error::InvalidColor("#12345g".to_owned()))
        );
    }

    #[test]
    fn blank_description_becomes_none() {
        let form = CategoryFormData {
            name: "Food".to_owned(),
            description: "   ".to_owned(),
            color: String::new(),
        };

        let category = form.validate().unwrap();

        assert_eq!(category.description, None);
        assert_eq!(category.color, DEFAULT_COLOR);
    }

    #[test]
    fn long_description_is_rejected() {
        let form = CategoryFormData {
            name: "Food".to_owned(),
            description: "a".repeat(201),
            color: String::new(),
        };

        assert_eq!(form.validate(), Err(Error::CategoryDescriptionTooLong));
    }
}
