use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use finance_tracker::{
    Amount, PasswordHash, Transaction, TransactionKind, ValidatedPassword,
    accounts::{NewUser, create_user},
    create_transaction, get_categories, get_or_create_profile, initialize_db,
    seed_default_categories,
};

/// A utility for creating a demo database with a user and a few months of records.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of months of expenses and income to create.
    #[arg(long, default_value_t = 6)]
    months: i64,
}

/// Title, amount in cents, category name and day of the month offset of the recurring expenses.
const MONTHLY_EXPENSES: [(&str, i64, &str, i64); 8] = [
    ("Rent", 180_000, "Housing", 0),
    ("Supermarket", 14_250, "Food & Dining", 3),
    ("Bus pass", 6_000, "Transportation", 5),
    ("Power bill", 11_830, "Utilities", 9),
    ("Cinema", 3_200, "Entertainment", 12),
    ("Supermarket", 12_990, "Food & Dining", 17),
    ("Pharmacy", 2_475, "Healthcare", 21),
    ("New shoes", 8_999, "Shopping", 25),
];

/// Title, amount in cents, category name and day of the month offset of the recurring income.
const MONTHLY_INCOME: [(&str, i64, &str, i64); 2] = [
    ("Salary", 420_000, "Salary", 1),
    ("Website for a friend", 35_000, "Freelance", 14),
];

/// Create and populate a database for demos and manual testing.
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

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("demo"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            username: "demo".to_owned(),
            email: "demo@example.com".to_owned(),
            first_name: "Demo".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        &connection,
    )?;
    get_or_create_profile(user.id, &connection)?;
    let seeded = seed_default_categories(&connection, user.id)?;
    println!("Created {seeded} categories.");

    let categories = get_categories(user.id, &connection)?;
    let category_id = |name: &str| {
        categories
            .iter()
            .find(|category| category.name.as_ref() == name)
            .map(|category| category.id)
    };

    let today = OffsetDateTime::now_utc().date();
    let mut record_count = 0;

    for month in 0..args.months.max(0) {
        let month_start = today - Duration::days(30 * (month + 1));

        for (kind, records) in [
            (TransactionKind::Expense, MONTHLY_EXPENSES.as_slice()),
            (TransactionKind::Income, MONTHLY_INCOME.as_slice()),
        ] {
            for &(title, cents, category, day_offset) in records {
                let date: Date = month_start + Duration::days(day_offset);
                if date > today {
                    continue;
                }

                create_transaction(
                    user.id,
                    kind,
                    Transaction::build(title, Amount::from_cents(cents), date)
                        .category(category_id(category)),
                    &connection,
                )?;
                record_count += 1;
            }
        }
    }

    println!("Created {record_count} expenses and income.");
    println!("Success! Log in with the username 'demo' and the password 'demo'.");

    Ok(())
}
