use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;

use finance_tracker::{
    Email, NewTransaction, PasswordHash, ValidatedPassword, create_transaction, create_user,
    initialize_db,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo123";

/// A utility for creating a demo database for the finance_tracker server.
///
/// The database holds one user, demo@example.com with the password demo123,
/// and a handful of example transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'finance.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user {DEMO_EMAIL}...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    let transaction = conn.transaction()?;
    let user = create_user(Email::new(DEMO_EMAIL)?, password_hash, &transaction)?;

    println!("Creating demo transactions...");

    let demo_transactions = [
        NewTransaction::new("Initial Savings", Decimal::new(1000, 0), "income"),
        NewTransaction::new("Groceries", Decimal::new(50, 0), "expense"),
        NewTransaction::new("Salary", Decimal::new(2500, 0), "income"),
        NewTransaction::new("Gas", Decimal::new(45, 0), "expense"),
        NewTransaction::new("Freelance Work", Decimal::new(300, 0), "income"),
    ];

    for demo_transaction in demo_transactions {
        create_transaction(demo_transaction, user.id, &transaction)?;
    }

    transaction.commit()?;

    println!("Success! Log in as {DEMO_EMAIL} with the password {DEMO_PASSWORD}.");

    Ok(())
}
