use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    BudgetPeriod, PasswordHash, Transaction, TransactionType, ValidatedPassword,
    create_budget_goal, create_transaction, create_user, get_category_by_name, initialize_db,
    scan_receipt,
};

/// A utility for creating a test database for the finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of transactions to generate, ending today.
    #[arg(long, default_value_t = 90)]
    days: i64,
}

/// Recurring expenses as (category, description, amount, every n days).
const EXPENSES: [(&str, &str, f64, i64); 6] = [
    ("Food", "Groceries", 85.40, 7),
    ("Food", "Coffee", 4.50, 2),
    ("Transportation", "Bus fare", 3.20, 3),
    ("Housing", "Rent", 450.00, 14),
    ("Entertainment", "Movie night", 24.00, 10),
    ("Healthcare", "Pharmacy", 18.75, 30),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user 'demo' with password 'test'...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("demo", "demo@example.com", password_hash, &connection)?;

    let today = OffsetDateTime::now_utc().date();
    let start = today - Duration::days(args.days.max(1) - 1);

    println!("Creating transactions from {start} to {today}...");
    let salary = get_category_by_name("Salary", &connection)?;
    let freelance = get_category_by_name("Freelance", &connection)?;
    let mut count = 0;

    for offset in 0..args.days.max(1) {
        let date = start + Duration::days(offset);

        if offset % 14 == 0 {
            let builder = Transaction::build(2400.0, TransactionType::Income, date, salary.id)
                .description("Fortnightly pay");
            create_transaction(builder, user.id, &connection)?;
            count += 1;
        }

        if offset % 30 == 15 {
            let builder = Transaction::build(350.0, TransactionType::Income, date, freelance.id)
                .description("Website contract");
            create_transaction(builder, user.id, &connection)?;
            count += 1;
        }

        for (category_name, description, amount, every) in EXPENSES {
            if offset % every != 0 {
                continue;
            }

            let category = get_category_by_name(category_name, &connection)?;
            // Up to 20% day-to-day variation.
            let amount = amount * (1.0 + (offset % 5) as f64 * 0.05);
            let builder = Transaction::build(amount, TransactionType::Expense, date, category.id)
                .description(description);
            create_transaction(builder, user.id, &connection)?;
            count += 1;
        }
    }
    println!("Created {count} transactions.");

    println!("Creating budget goals...");
    let food = get_category_by_name("Food", &connection)?;
    let entertainment = get_category_by_name("Entertainment", &connection)?;
    let month_start = today.replace_day(1)?;
    create_budget_goal(
        user.id,
        food.id,
        400.0,
        BudgetPeriod::Monthly,
        month_start,
        &connection,
    )?;
    create_budget_goal(
        user.id,
        entertainment.id,
        30.0,
        BudgetPeriod::Weekly,
        today - Duration::days(3),
        &connection,
    )?;

    println!("Scanning a sample receipt...");
    scan_receipt(user.id, "receipt.jpg", b"sample receipt image", &connection)?;

    println!("Success!");

    Ok(())
}
