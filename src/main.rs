// Pixelfleet CLI binary

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pixelfleet::db::{open_db, schema};
use pixelfleet::migrate::migrate_legacy_db;

#[derive(Parser)]
#[command(name = "pixelfleet")]
#[command(about = "Pixelfleet - fleet backend tools for pixel-matrix displays", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a legacy blob store into a fleet database
    Migrate {
        /// Path to the legacy key/value store
        legacy_db: PathBuf,
        /// Path to the destination fleet database (created if absent)
        dest_db: PathBuf,
        /// Assets directory used to validate migrated script paths
        #[arg(long)]
        assets_dir: Option<PathBuf>,
        /// Migrate even if the destination already contains users
        #[arg(long)]
        force: bool,
    },

    /// Show entity counts for a fleet database
    Status {
        /// Path to the fleet database
        dest_db: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            legacy_db,
            dest_db,
            assets_dir,
            force,
        } => cmd_migrate(legacy_db, dest_db, assets_dir, force),
        Commands::Status { dest_db } => cmd_status(dest_db),
    }
}

fn cmd_migrate(
    legacy_db: PathBuf,
    dest_db: PathBuf,
    assets_dir: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    // Calling policy: a populated destination means migration already ran.
    // The core itself would re-insert and fail per user, so refuse up front.
    if dest_db.exists() {
        let conn = open_db(&dest_db)?;
        let existing = schema::count_users(&conn)?;
        if existing > 0 && !force {
            println!(
                "Destination already has {} user(s); skipping migration. Use --force to run anyway.",
                existing
            );
            return Ok(());
        }
    }

    println!(
        "Migrating {} into {}",
        legacy_db.display(),
        dest_db.display()
    );

    let summary = migrate_legacy_db(&legacy_db, &dest_db, assets_dir.as_deref())?;

    println!();
    println!("Migration complete:");
    println!("  Legacy rows:    {}", summary.total_rows);
    println!("  Users migrated: {}", summary.users_migrated);
    println!("  Users skipped:  {}", summary.users_skipped);
    println!("  Invalid rows:   {}", summary.rows_invalid);
    println!("  Devices:        {}", summary.devices_created);
    println!("  Apps:           {}", summary.apps_created);

    if summary.users_skipped > 0 || summary.rows_invalid > 0 {
        println!();
        println!("Some rows were skipped; inspect the log before archiving the legacy store.");
    }

    Ok(())
}

fn cmd_status(dest_db: PathBuf) -> Result<()> {
    if !dest_db.exists() {
        anyhow::bail!("No fleet database at {}", dest_db.display());
    }
    let conn = open_db(&dest_db)?;

    let users = schema::count_users(&conn)?;
    let devices = schema::count_devices(&conn)?;
    let apps = schema::count_apps(&conn)?;

    println!("Fleet database: {}", dest_db.display());
    println!("  Users:   {}", users);
    println!("  Devices: {}", devices);
    println!("  Apps:    {}", apps);

    if users == 0 {
        return Ok(());
    }

    println!();
    println!("{:<20}  {:>8}  {:>6}", "User", "Devices", "Apps");
    println!("{}", "-".repeat(40));

    for username in schema::list_usernames(&conn)? {
        let devices = schema::list_devices(&conn, &username)?;
        let mut app_count = 0usize;
        for device in &devices {
            app_count += schema::list_apps(&conn, &device.id)?.len();
        }
        println!("{:<20}  {:>8}  {:>6}", username, devices.len(), app_count);
    }

    Ok(())
}
