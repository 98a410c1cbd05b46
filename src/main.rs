//! Trade Route Finder
//!
//! Enumerates chains of barter trades leading away from, or towards, an item.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use regex::Regex;
use rusqlite::Connection;

use trade_routes::catalog::Catalog;
use trade_routes::explorer::{self, ExplorerConfig, Search};
use trade_routes::models::TradeRule;
use trade_routes::request::{RequestError, RouteRequest};
use trade_routes::{db, import};

#[derive(Parser)]
#[command(name = "trade-routes")]
#[command(about = "Print trade routes for barter traders")]
struct Cli {
    /// Path to the SQLite database of imported trades
    #[arg(short, long, default_value = "trade_data.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Direction of trade, as seen from the requested item
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TradeDirection {
    /// Obtain COUNT of ITEM by trading towards it
    To,
    /// Trade COUNT of ITEM away
    From,
}

impl TradeDirection {
    fn search(self) -> Search {
        match self {
            TradeDirection::To => Search::Backward,
            TradeDirection::From => Search::Forward,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find every trade route to or from an item
    Route {
        /// Direction of trade
        direction: TradeDirection,

        /// Amount to trade
        #[arg(allow_negative_numbers = true)]
        count: i64,

        /// Item to trade
        item: String,

        /// Read trades from this CSV file instead of the database
        #[arg(long)]
        trade_data_file: Option<PathBuf>,

        /// Stop extending routes after this many trades
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print each complete route separately instead of a tree
        #[arg(long, conflicts_with = "nested")]
        flat: bool,

        /// Print the collapsed nested route structure
        #[arg(long)]
        nested: bool,

        /// Print a summary after the routes
        #[arg(short, long)]
        summary: bool,
    },

    /// Import trade data from a CSV file or a directory of CSV files
    Import {
        /// CSV file or directory to scan
        path: PathBuf,

        /// Clear existing trades before importing
        #[arg(long)]
        clear: bool,
    },

    /// List all tradable items
    Items {
        /// Only show items matching this regular expression
        #[arg(short, long)]
        filter: Option<String>,

        /// Read trades from this CSV file instead of the database
        #[arg(long)]
        trade_data_file: Option<PathBuf>,
    },

    /// List stored trades
    Trades {
        /// Only show trades involving this item
        #[arg(short, long)]
        item: Option<String>,

        /// Only show trades at locations matching this regular expression
        #[arg(short, long)]
        location: Option<String>,
    },

    /// List all trade locations in the database
    Locations,

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without a trade data file)
    LoadSample,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Route {
            direction,
            count,
            item,
            trade_data_file,
            max_depth,
            flat,
            nested,
            summary,
        } => {
            let catalog = open_catalog(&conn, trade_data_file.as_deref())?;

            let request = match RouteRequest::validate(direction.search(), count, &item, &catalog) {
                Ok(request) => request,
                Err(err @ RequestError::UnknownItem { .. }) => {
                    println!("{}", err);
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err.into()),
            };

            match direction {
                TradeDirection::To => println!("Trading to {} {}", count, item),
                TradeDirection::From => println!("Trading from {} {}", count, item),
            }

            let routes = request.explore(&catalog, ExplorerConfig { max_depth });

            if routes.is_empty() {
                println!("No trade routes found.");
            } else if flat {
                for (index, route) in explorer::flatten(&routes).iter().enumerate() {
                    println!("Route {}:", index + 1);
                    for transaction in route {
                        println!("  {}", transaction);
                    }
                }
            } else if nested {
                print!("{}", explorer::format_nested(&explorer::to_nested(&routes), 0));
            } else {
                print!("{}", explorer::format_routes(&routes, 0));
            }

            if summary {
                println!();
                println!("{}", explorer::summarize(&routes, &request.item, &request.quantity));
            }
        }

        Commands::Import { path, clear } => {
            if clear {
                println!("Clearing existing trades...");
                db::clear_trades(&conn)?;
            }

            let stats = import::import_to_database(&conn, &path)?;
            println!("{}", stats);
        }

        Commands::Items {
            filter,
            trade_data_file,
        } => {
            let catalog = open_catalog(&conn, trade_data_file.as_deref())?;
            let pattern = filter
                .map(|f| Regex::new(&f).with_context(|| format!("Invalid filter '{}'", f)))
                .transpose()?;

            if catalog.is_empty() {
                println!("No trades loaded. Run 'import' or 'load-sample' first.");
            } else {
                println!("Tradable items:");
                for item in catalog.known_items() {
                    if pattern.as_ref().is_none_or(|p| p.is_match(item)) {
                        println!("  {}", item);
                    }
                }
            }
        }

        Commands::Trades { item, location } => {
            let pattern = location
                .map(|l| Regex::new(&l).with_context(|| format!("Invalid location pattern '{}'", l)))
                .transpose()?;

            let trades: Vec<TradeRule> = db::list_trades(&conn)?
                .into_iter()
                .filter(|t| {
                    item.as_ref()
                        .is_none_or(|i| &t.from_item == i || &t.to_item == i)
                })
                .filter(|t| pattern.as_ref().is_none_or(|p| p.is_match(&t.location)))
                .collect();

            if trades.is_empty() {
                println!("No matching trades in database.");
            } else {
                println!("{:<20} {:>6} {:<20} {:>6} {:<20}", "Location", "Give", "Item", "Get", "Item");
                println!("{}", "-".repeat(76));
                for t in trades {
                    println!(
                        "{:<20} {:>6} {:<20} {:>6} {:<20}",
                        t.location, t.from_count, t.from_item, t.to_count, t.to_item
                    );
                }
            }
        }

        Commands::Locations => {
            let locations = db::list_locations(&conn)?;
            if locations.is_empty() {
                println!("No trades in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Trade locations:");
                for l in locations {
                    println!("  {}", l);
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Build the catalog from a CSV file if one was given, otherwise from the database
fn open_catalog(conn: &Connection, trade_data_file: Option<&Path>) -> Result<Catalog> {
    match trade_data_file {
        Some(path) => import::load_catalog(path),
        None => {
            let catalog = Catalog::from_rules(db::list_trades(conn)?);
            info!(
                "Loaded {} trades over {} items from database",
                catalog.len(),
                catalog.known_items().len()
            );
            Ok(catalog)
        }
    }
}

/// Load a small sample catalog for testing without a trade data file
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_trades(conn)?;

    let sample = [
        TradeRule::new("Town", 2, "Wood", 5, "Nails"),
        TradeRule::new("Town", 5, "Nails", 1, "Hammer"),
        TradeRule::new("Port", 3, "Fish", 1, "Salt"),
        TradeRule::new("Port", 1, "Salt", 4, "Nails"),
        TradeRule::new("Village", 1, "Hammer", 3, "Bread"),
        TradeRule::new("Village", 2, "Bread", 5, "Fish"),
        TradeRule::new("Mine", 4, "Bread", 1, "Iron"),
        TradeRule::new("Mine", 2, "Iron", 15, "Nails"),
    ];

    for rule in &sample {
        db::insert_trade(conn, rule)?;
    }

    println!("Loaded {} sample trades", sample.len());
    Ok(())
}
