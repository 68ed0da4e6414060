//! Idplex CLI — identifier-unification graph engine.
//!
//! Usage:
//!   idplex ingest <batch.json> [--db path]
//!   idplex show <name> <value> [--db path]
//!   idplex stats [--db path]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use idplex::{
    Batch, GraphSession, NeighborFilter, NodeKey, OpenStore, SqliteStore, Unifier, PERSON_ROOT,
};

#[derive(Parser)]
#[command(
    name = "idplex",
    version,
    about = "Identifier-unification graph engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a harvest batch file (JSON: source, event, rows)
    Ingest {
        /// Path to the batch file
        file: PathBuf,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Show a node and its neighbors
    Show {
        /// Identifier kind (e.g. ORCID)
        name: String,
        /// Identifier value
        value: String,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print graph statistics
    Stats {
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Get the default database path (~/.local/share/idplex/idplex.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let idplex_dir = data_dir.join("idplex");
    std::fs::create_dir_all(&idplex_dir).ok();
    idplex_dir.join("idplex.db")
}

fn open_session(db: Option<PathBuf>) -> Result<Arc<GraphSession>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(GraphSession::with_store(Arc::new(store))))
}

fn cmd_ingest(session: Arc<GraphSession>, file: &PathBuf) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let batch: Batch = match serde_json::from_str(&text) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Error: '{}' is not a valid batch file: {}", file.display(), e);
            return 1;
        }
    };

    let unifier = Unifier::new(session);
    match unifier.process_batch(&batch) {
        Ok(summary) => {
            println!(
                "Processed {} rows from '{}' ({} skipped): {} roots created, {} extended, {} merged",
                summary.rows_processed,
                batch.source,
                summary.rows_skipped,
                summary.roots_created,
                summary.roots_extended,
                summary.roots_merged,
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_show(session: Arc<GraphSession>, name: &str, value: &str) -> i32 {
    let key = match NodeKey::derive(name, value) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let node = match session.get_node(&key) {
        Ok(Some(node)) => node,
        Ok(None) => {
            eprintln!("No node for {} = '{}'", name, value);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match serde_json::to_string_pretty(&node) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    match session.neighbors(&key, &NeighborFilter::new()) {
        Ok(neighbors) => {
            println!("Neighbors ({}):", neighbors.len());
            for neighbor in neighbors {
                println!("  {} = '{}' [{}]", neighbor.name, neighbor.value, neighbor.category);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(session: Arc<GraphSession>) -> i32 {
    let counts = session
        .node_count()
        .and_then(|nodes| session.edge_count().map(|edges| (nodes, edges)))
        .and_then(|(nodes, edges)| {
            session
                .nodes_by_name(PERSON_ROOT)
                .map(|roots| (nodes, edges, roots.len()))
        });
    match counts {
        Ok((nodes, edges, persons)) => {
            println!("Nodes:        {}", nodes);
            println!("Edges:        {}", edges);
            println!("Person-roots: {}", persons);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Ingest { file, db } => match open_session(db) {
            Ok(session) => cmd_ingest(session, &file),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Show { name, value, db } => match open_session(db) {
            Ok(session) => cmd_show(session, &name, &value),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Stats { db } => match open_session(db) {
            Ok(session) => cmd_stats(session),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    };
    std::process::exit(code);
}
