use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use finance_tracker::{delete_user, get_user_by_username, initialize_db};

/// A utility for deleting a user and all of their categories, expenses and income.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The username of the user to delete.
    #[arg(long)]
    username: String,

    /// Delete without asking for confirmation.
    #[arg(long, short)]
    yes: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let user = match get_user_by_username(&args.username, &connection) {
        Ok(user) => user,
        Err(error) => {
            eprintln!("Could not find the user \"{}\": {error}", args.username);
            exit(1);
        }
    };

    if !args.yes && !confirm(&format!(
        "Delete {} ({}) and all of their data? [y/N] ",
        user.username, user.email
    ))? {
        println!("Cancelled.");
        return Ok(());
    }

    delete_user(user.id, &connection)?;
    println!("Deleted {}.", user.username);

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, io::Error> {
    use std::io::Write;

    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
