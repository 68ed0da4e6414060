//! SQLite storage backend for idplex

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::traits::{GraphStore, NeighborFilter, OpenStore, StorageResult};
use crate::graph::{Node, NodeKey};

/// SQLite-backed graph store
///
/// One database file with a `nodes` table keyed by the derived node key and
/// an `edges` table holding both directed rows of every undirected edge.
/// Provenance (`_source`, `_history`) is stored as JSON columns.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Nodes table: one row per distinct (name, value) pair.
            -- key is derived by the key codec; the uniqueness constraint
            -- for the whole graph.
            CREATE TABLE IF NOT EXISTS nodes (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                category TEXT NOT NULL,
                comment TEXT,
                year TEXT,
                url_main TEXT,
                url_other TEXT,
                sources_json TEXT NOT NULL,
                history_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_name
                ON nodes(name);
            CREATE INDEX IF NOT EXISTS idx_nodes_category
                ON nodes(category);

            -- Edges table: both directions of every undirected edge, so
            -- neighbor lookup from either endpoint is a single indexed scan.
            CREATE TABLE IF NOT EXISTS edges (
                source_key TEXT NOT NULL,
                target_key TEXT NOT NULL,
                PRIMARY KEY (source_key, target_key),
                FOREIGN KEY (source_key) REFERENCES nodes(key) ON DELETE CASCADE,
                FOREIGN KEY (target_key) REFERENCES nodes(key) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_edges_target
                ON edges(target_key);

            -- Enable foreign keys (per-connection pragma)
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Serialize a node's provenance to JSON columns
    fn provenance_to_json(node: &Node) -> StorageResult<(String, String)> {
        Ok((
            serde_json::to_string(&node.sources)?,
            serde_json::to_string(&node.history)?,
        ))
    }

    /// Deserialize a node from database columns
    #[allow(clippy::too_many_arguments)]
    fn row_to_node(
        name: String,
        value: String,
        category: String,
        comment: Option<String>,
        year: Option<String>,
        url_main: Option<String>,
        url_other: Option<String>,
        sources_json: String,
        history_json: String,
    ) -> StorageResult<Node> {
        Ok(Node {
            name,
            value,
            category,
            comment,
            year,
            url_main,
            url_other,
            sources: serde_json::from_str(&sources_json)?,
            history: serde_json::from_str(&history_json)?,
        })
    }

    /// Run a node SELECT with the standard column list and collect results.
    fn query_nodes(
        conn: &Connection,
        sql: &str,
        args: &[String],
    ) -> StorageResult<Vec<Node>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut nodes = Vec::new();
        for row in rows {
            let (name, value, category, comment, year, url_main, url_other, sources, history) =
                row?;
            nodes.push(Self::row_to_node(
                name, value, category, comment, year, url_main, url_other, sources, history,
            )?);
        }
        Ok(nodes)
    }
}

const NODE_COLUMNS: &str =
    "name, value, category, comment, year, url_main, url_other, sources_json, history_json";

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    fn get_node(&self, key: &NodeKey) -> StorageResult<Option<Node>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE key = ?1"),
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((name, value, category, comment, year, url_main, url_other, sources, history)) => {
                Ok(Some(Self::row_to_node(
                    name, value, category, comment, year, url_main, url_other, sources, history,
                )?))
            }
            None => Ok(None),
        }
    }

    fn create_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let (sources_json, history_json) = Self::provenance_to_json(node)?;

        conn.execute(
            r#"
            INSERT INTO nodes (key, name, value, category, comment, year,
                               url_main, url_other, sources_json, history_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                key.as_str(),
                node.name,
                node.value,
                node.category,
                node.comment,
                node.year,
                node.url_main,
                node.url_other,
                sources_json,
                history_json,
            ],
        )?;
        Ok(())
    }

    fn update_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let (sources_json, history_json) = Self::provenance_to_json(node)?;

        conn.execute(
            r#"
            UPDATE nodes SET
                name = ?2, value = ?3, category = ?4, comment = ?5, year = ?6,
                url_main = ?7, url_other = ?8, sources_json = ?9, history_json = ?10
            WHERE key = ?1
            "#,
            params![
                key.as_str(),
                node.name,
                node.value,
                node.category,
                node.comment,
                node.year,
                node.url_main,
                node.url_other,
                sources_json,
                history_json,
            ],
        )?;
        Ok(())
    }

    fn delete_node(&self, key: &NodeKey) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        // Incident edges go with the node via ON DELETE CASCADE.
        let deleted = conn.execute("DELETE FROM nodes WHERE key = ?1", params![key.as_str()])?;
        Ok(deleted > 0)
    }

    fn nodes_by_name(&self, name: &str) -> StorageResult<Vec<Node>> {
        let conn = self.conn.lock().unwrap();
        Self::query_nodes(
            &conn,
            &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE name = ?1 ORDER BY key"),
            &[name.to_string()],
        )
    }

    fn create_edge(&self, a: &NodeKey, b: &NodeKey) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let created = conn.execute(
            "INSERT OR IGNORE INTO edges (source_key, target_key) VALUES (?1, ?2)",
            params![a.as_str(), b.as_str()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO edges (source_key, target_key) VALUES (?1, ?2)",
            params![b.as_str(), a.as_str()],
        )?;
        Ok(created > 0)
    }

    fn neighbors(&self, key: &NodeKey, filter: &NeighborFilter) -> StorageResult<Vec<Node>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!(
            "SELECT {} FROM edges e JOIN nodes n ON n.key = e.target_key WHERE e.source_key = ?1",
            NODE_COLUMNS
                .split(", ")
                .map(|c| format!("n.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut args = vec![key.as_str().to_string()];
        if let Some(name) = &filter.name {
            args.push(name.clone());
            sql.push_str(&format!(" AND n.name = ?{}", args.len()));
        }
        if let Some(category) = &filter.category {
            args.push(category.clone());
            sql.push_str(&format!(" AND n.category = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY n.key");

        Self::query_nodes(&conn, &sql, &args)
    }

    fn node_count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn edge_count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let directed: i64 = conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok((directed / 2) as usize)
    }
}
