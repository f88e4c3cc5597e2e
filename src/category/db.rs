//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, NewCategory},
};

/// The categories every new database starts with: (name, description, color).
const DEFAULT_CATEGORIES: [(&str, &str, &str); 10] = [
    ("Food", "Groceries, restaurants and takeaways", "#28a745"),
    ("Transportation", "Fuel, public transport and car costs", "#007bff"),
    ("Housing", "Rent, mortgage and utilities", "#dc3545"),
    ("Healthcare", "Doctors, medicine and insurance", "#fd7e14"),
    ("Entertainment", "Movies, games and going out", "#6f42c1"),
    ("Education", "Courses, books and tuition", "#20c997"),
    ("Clothing", "Clothes, shoes and accessories", "#e83e8c"),
    ("Salary", "Wages and regular employment income", "#28a745"),
    ("Freelance", "Contract and side-project income", "#17a2b8"),
    ("Other", "Anything that does not fit elsewhere", "#6c757d"),
];

/// Create the category table.
///
/// # Errors
/// Returns an error if the table could not be created.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                color TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default categories that are not in the database yet.
///
/// # Errors
/// Returns an [Error::SqlError] if an insert fails.
pub fn seed_default_categories(connection: &Connection) -> Result<(), Error> {
    let created_at = OffsetDateTime::now_utc();
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (name, description, color, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (name, description, color) in DEFAULT_CATEGORIES {
        statement.execute((name, description, color, created_at))?;
    }

    Ok(())
}

/// Create a category in the database.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if the name is taken, or an
/// [Error::SqlError] for any other SQL error.
pub fn create_category(
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO category (name, description, color, created_at) VALUES (?1, ?2, ?3, ?4)",
        (
            category.name.as_ref(),
            &category.description,
            &category.color,
            created_at,
        ),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: category.name,
        description: category.description,
        color: category.color,
        created_at,
    })
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        description: row.get(2)?,
        color: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Retrieve a category by its `category_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, description, color, created_at FROM category WHERE id = :id")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a category by its exact `name`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category.
pub fn get_category_by_name(name: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, description, color, created_at FROM category WHERE name = :name",
        )?
        .query_row(&[(":name", name)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, description, color, created_at FROM category ORDER BY name")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Replace the name, description and color of a category.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category does not exist, or
/// [Error::DuplicateCategoryName] if another category has the new name.
pub fn update_category(
    category_id: CategoryId,
    category: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, description = ?2, color = ?3 WHERE id = ?4",
        (
            category.name.as_ref(),
            &category.description,
            &category.color,
            category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Count the transactions, across all users, that reference a category.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn count_transactions_in_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1",
            [category_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete a category that no transaction references, along with its budget goals.
///
/// # Errors
/// Returns:
/// - [Error::DeleteMissingCategory] if the category does not exist,
/// - [Error::CategoryInUse] if transactions still reference the category.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let category = match get_category(category_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::DeleteMissingCategory),
        Err(error) => return Err(error),
    };

    let transaction_count = count_transactions_in_category(category_id, connection)?;
    if transaction_count > 0 {
        return Err(Error::CategoryInUse {
            name: category.name.to_string(),
            transaction_count,
        });
    }

    // The category's budget goals go with it, see the budget_goal foreign key.
    connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    Ok(())
}

#[cfg(test)]
mod category_db_tests {
    use time::macros::date;

    use crate::{
        Error,
        budget_goal::{BudgetPeriod, create_budget_goal},
        category::{CategoryName, DEFAULT_COLOR, NewCategory},
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{
        count_transactions_in_category, create_category, delete_category, get_all_categories,
        get_category, get_category_by_name, update_category,
    };

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: CategoryName::new_unchecked(name),
            description: None,
            color: DEFAULT_COLOR.to_owned(),
        }
    }

    #[test]
    fn database_starts_with_default_categories() {
        let connection = get_test_connection();

        let names = get_all_categories(&connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            [
                "Clothing",
                "Education",
                "Entertainment",
                "Food",
                "Freelance",
                "Healthcare",
                "Housing",
                "Other",
                "Salary",
                "Transportation"
            ]
        );
    }

    #[test]
    fn create_and_get_category() {
        let connection = get_test_connection();

        let inserted = create_category(new_category("Pets"), &connection).unwrap();

        assert_eq!(get_category(inserted.id, &connection), Ok(inserted.clone()));
        assert_eq!(get_category_by_name("Pets", &connection), Ok(inserted));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let connection = get_test_connection();

        let result = create_category(new_category("Food"), &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn get_missing_category_returns_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_category(999, &connection), Err(Error::NotFound));
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_connection();
        let category = create_category(new_category("Pets"), &connection).unwrap();

        update_category(
            category.id,
            NewCategory {
                name: CategoryName::new_unchecked("Animals"),
                description: Some("Vet bills".to_owned()),
                color: "#123456".to_owned(),
            },
            &connection,
        )
        .unwrap();

        let updated = get_category(category.id, &connection).unwrap();
        assert_eq!(updated.name.as_ref(), "Animals");
        assert_eq!(updated.description.as_deref(), Some("Vet bills"));
        assert_eq!(updated.color, "#123456");
    }

    #[test]
    fn update_missing_category_fails() {
        let connection = get_test_connection();

        let result = update_category(999, new_category("Pets"), &connection);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_unused_category_succeeds() {
        let connection = get_test_connection();
        let category = create_category(new_category("Pets"), &connection).unwrap();

        delete_category(category.id, &connection).unwrap();

        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_category_removes_its_budget_goals() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(new_category("Pets"), &connection).unwrap();
        let goal = create_budget_goal(
            user.id,
            category.id,
            50.0,
            BudgetPeriod::Monthly,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();

        delete_category(category.id, &connection).unwrap();

        let remaining: i64 = connection
            .query_row(
                "SELECT COUNT(id) FROM budget_goal WHERE id = ?1",
                [goal.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();

        assert_eq!(
            delete_category(999, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn delete_category_with_transactions_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(new_category("Pets"), &connection).unwrap();
        for _ in 0..2 {
            create_transaction(
                Transaction::build(
                    12.5,
                    TransactionType::Expense,
                    date!(2025 - 01 - 10),
                    category.id,
                )
                .description("Dog food"),
                user.id,
                &connection,
            )
            .unwrap();
        }

        let result = delete_category(category.id, &connection);

        assert_eq!(
            result,
            Err(Error::CategoryInUse {
                name: "Pets".to_owned(),
                transaction_count: 2
            })
        );
        assert!(get_category(category.id, &connection).is_ok());
        assert_eq!(
            count_transactions_in_category(category.id, &connection),
            Ok(2)
        );
    }
}
