use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_therapy::database;
use music_therapy::Table;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "db-tool", version, about = "Reads from and writes to the song database")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Database server, as host, host:port or host,port.
    #[clap(long)]
    pub server: String,

    /// Name of the database.
    #[clap(long)]
    pub database: String,

    /// Login name. Without it the current OS user is used.
    #[clap(long, requires = "password")]
    pub username: Option<String>,

    #[clap(long, requires = "username")]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a query and prints the result to stdout as CSV.
    Read {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// The SELECT statement to run.
        #[clap(long)]
        sql: String,
    },

    /// Inserts every row of a CSV file into a table. The CSV header names
    /// the columns.
    Write {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Destination table.
        #[clap(long)]
        table: String,

        #[clap(long, value_parser = parse_path)]
        csv: PathBuf,
    },
}

async fn read(connection: ConnectionArgs, sql: &str) -> Result<()> {
    let table = match (&connection.username, &connection.password) {
        (Some(username), Some(password)) => {
            database::read_with_credentials(
                &connection.server,
                &connection.database,
                username,
                password,
                sql,
            )
            .await?
        }
        _ => database::read_trusted(&connection.server, &connection.database, sql).await?,
    };
    info!("{} rows", table.len());
    table.write_csv(io::stdout().lock())?;
    Ok(())
}

async fn write(connection: ConnectionArgs, table_name: &str, csv: &Path) -> Result<()> {
    let file = File::open(csv).with_context(|| format!("Could not open {:?}", csv))?;
    // Cells stay text; the server converts them to the column types
    let table = Table::from_csv_text_reader(file)
        .with_context(|| format!("Could not parse {:?}", csv))?;

    match (&connection.username, &connection.password) {
        (Some(username), Some(password)) => {
            database::write_with_credentials(
                &connection.server,
                &connection.database,
                username,
                password,
                table_name,
                table.columns(),
                table.rows(),
            )
            .await?
        }
        _ => {
            database::write_trusted(
                &connection.server,
                &connection.database,
                table_name,
                table.columns(),
                table.rows(),
            )
            .await?
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // stdout carries the CSV output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    match cli_args.command {
        Command::Read { connection, sql } => read(connection, &sql).await,
        Command::Write {
            connection,
            table,
            csv,
        } => write(connection, &table, &csv).await,
    }
}
