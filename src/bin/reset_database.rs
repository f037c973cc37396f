use std::error::Error;
use std::process::exit;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use finance_tracker::services::auth_service::hash_password;

/// Drop every application table, re-apply the migrations and create one admin account.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Display name of the admin account.
    #[arg(long, default_value = "Administrator")]
    admin_name: String,

    /// Email of the admin account.
    #[arg(long)]
    admin_email: String,

    /// Password of the admin account.
    #[arg(long)]
    admin_password: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.admin_password.len() < 8 {
        eprintln!("The admin password must be at least 8 characters.");
        exit(1);
    }

    if !args.yes {
        println!("This deletes every user, category and expense. Type 'yes' to continue:");
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if answer.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.database_url)
        .await?;

    println!("Dropping tables...");
    for table in ["expenses", "categories", "users", "_sqlx_migrations"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(&pool)
            .await?;
    }

    println!("Applying migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("Creating admin account {}...", args.admin_email);
    sqlx::query("INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, 'admin')")
        .bind(&args.admin_name)
        .bind(&args.admin_email)
        .bind(hash_password(&args.admin_password)?)
        .execute(&pool)
        .await?;

    println!("Success!");

    Ok(())
}
