use std::error::Error;

use clap::Parser;

use finance_tracker::services::auth_service::hash_password;

/// Print the bcrypt hash of a password, for seeding accounts by hand.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The plain-text password to hash.
    password: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("{}", hash_password(&args.password)?);

    Ok(())
}
