//! SQLite Storage for runtime data
//!
//! 런타임 데이터 저장:
//! - Threads: 대화 스레드 / 위임 작업 스레드
//! - Messages: 스레드별 메시지 로그 (append-only)
//! - Tasks: 위임 작업 상태
//! - Agent Runs: sub-agent 호출 기록
//! - Usage Metrics: 토큰/비용 샘플
//!
//! 설정 데이터는 JSON (storage/json/)에서 관리

use super::gateway::DelegationStore;
use super::records::{
    now_rfc3339, AgentRunRecord, AgentRunStatus, MessageRecord, MessageRole, TaskRecord,
    TaskStatus, ThreadKind, ThreadRecord, ThreadStatus, UsageMetricRecord,
};
use crate::{Error, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "relay.db";

const THREAD_COLUMNS: &str = "id, kind, status, name, parent_thread_id, created_at, updated_at";

const TASK_COLUMNS: &str = "id, thread_id, prompt, status, max_iterations, current_iteration, \
                            model, result, created_at, updated_at, completed_at";

/// Storage service for persisting runtime data
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Create a new storage instance
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| Error::storage("Failed to create data directory", e))?;

        let db_path = data_dir.join(DATABASE_FILE);
        let conn =
            Connection::open(&db_path).map_err(|e| Error::storage("Failed to open database", e))?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| Error::storage("Failed to set pragmas", e))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.initialize_schema()?;

        debug!(path = %db_path.display(), "Opened storage");
        Ok(storage)
    }

    /// Create an in-memory storage (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage("Failed to open in-memory database", e))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::storage("Failed to set pragmas", e))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.initialize_schema()?;

        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Internal("Lock poisoned".to_string()))
    }

    /// Get current schema version from database
    pub fn get_schema_version(&self) -> Result<i32> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::storage("Failed to get schema version", e))
    }

    /// Initialize database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Threads (conversation + task threads)
            CREATE TABLE IF NOT EXISTS threads (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL CHECK(kind IN ('conversation', 'task')),
                status TEXT NOT NULL CHECK(status IN ('active', 'completed', 'failed')),
                name TEXT,
                parent_thread_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_threads_parent
                ON threads(parent_thread_id);
            CREATE INDEX IF NOT EXISTS idx_threads_updated
                ON threads(updated_at DESC);

            -- Messages (append-only)
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('user', 'assistant', 'system')),
                content TEXT NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_messages_thread
                ON messages(thread_id, created_at);

            -- Delegated tasks
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                thread_id TEXT NOT NULL UNIQUE,
                prompt TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('pending', 'running', 'evaluating', 'completed', 'failed')),
                max_iterations INTEGER NOT NULL,
                current_iteration INTEGER NOT NULL DEFAULT 0,
                model TEXT,
                result TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT,
                FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
            );

            -- Sub-agent invocations
            CREATE TABLE IF NOT EXISTS agent_runs (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                thread_id TEXT NOT NULL,
                model TEXT NOT NULL,
                input_tokens INTEGER NOT NULL,
                output_tokens INTEGER NOT NULL,
                cost_estimate REAL NOT NULL,
                duration_ms INTEGER NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('completed', 'failed')),
                error TEXT,
                completed_at TEXT NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_agent_runs_task
                ON agent_runs(task_id, completed_at);

            -- Usage metrics (4 samples per run)
            CREATE TABLE IF NOT EXISTS usage_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                name TEXT NOT NULL,
                value REAL NOT NULL,
                model TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                FOREIGN KEY (run_id) REFERENCES agent_runs(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_usage_metrics_name
                ON usage_metrics(name, model);

            INSERT OR IGNORE INTO schema_version (version) VALUES (1);
            "#,
        )
        .map_err(|e| Error::storage("Failed to initialize schema", e))?;

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::storage("Failed to get schema version", e))?;

        if version > CURRENT_SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "Database schema version {} is newer than supported version {}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn parse_column<T>(idx: usize, value: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{}'", value).into(),
        )
    })
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<ThreadRecord> {
    Ok(ThreadRecord {
        id: row.get(0)?,
        kind: parse_column(1, row.get(1)?, ThreadKind::parse)?,
        status: parse_column(2, row.get(2)?, ThreadStatus::parse)?,
        name: row.get(3)?,
        parent_thread_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        prompt: row.get(2)?,
        status: parse_column(3, row.get(3)?, TaskStatus::parse)?,
        max_iterations: row.get(4)?,
        current_iteration: row.get(5)?,
        model: row.get(6)?,
        result: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let metadata: Option<String> = row.get(4)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        role: parse_column(2, row.get(2)?, MessageRole::parse)?,
        content: row.get(3)?,
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
        created_at: row.get(5)?,
    })
}

fn agent_run_from_row(row: &Row<'_>) -> rusqlite::Result<AgentRunRecord> {
    Ok(AgentRunRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        thread_id: row.get(2)?,
        model: row.get(3)?,
        input_tokens: row.get::<_, i64>(4)?.max(0) as u64,
        output_tokens: row.get::<_, i64>(5)?.max(0) as u64,
        cost_estimate: row.get(6)?,
        duration_ms: row.get::<_, i64>(7)?.max(0) as u64,
        status: parse_column(8, row.get(8)?, AgentRunStatus::parse)?,
        error: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

// ============================================================================
// DelegationStore
// ============================================================================

impl DelegationStore for Storage {
    fn create_thread(&self, thread: &ThreadRecord) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO threads (id, kind, status, name, parent_thread_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                thread.id,
                thread.kind.as_str(),
                thread.status.as_str(),
                thread.name,
                thread.parent_thread_id,
                thread.created_at,
                thread.updated_at,
            ],
        )
        .map_err(|e| Error::storage("Failed to create thread", e))?;

        Ok(())
    }

    fn create_task_thread(&self, thread: &ThreadRecord, task: &TaskRecord) -> Result<()> {
        if task.thread_id != thread.id {
            return Err(Error::InvalidInput(format!(
                "Task {} must reference its own thread {}, got {}",
                task.id, thread.id, task.thread_id
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage("Failed to begin transaction", e))?;

        tx.execute(
            r#"
            INSERT INTO threads (id, kind, status, name, parent_thread_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                thread.id,
                thread.kind.as_str(),
                thread.status.as_str(),
                thread.name,
                thread.parent_thread_id,
                thread.created_at,
                thread.updated_at,
            ],
        )
        .map_err(|e| Error::storage("Failed to create task thread", e))?;

        tx.execute(
            r#"
            INSERT INTO tasks (id, thread_id, prompt, status, max_iterations, current_iteration,
                               model, result, created_at, updated_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                task.id,
                task.thread_id,
                task.prompt,
                task.status.as_str(),
                task.max_iterations,
                task.current_iteration,
                task.model,
                task.result,
                task.created_at,
                task.updated_at,
                task.completed_at,
            ],
        )
        .map_err(|e| Error::storage("Failed to create task", e))?;

        tx.commit()
            .map_err(|e| Error::storage("Failed to commit task creation", e))?;

        Ok(())
    }

    fn get_thread(&self, id: &str) -> Result<Option<ThreadRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {} FROM threads WHERE id = ?1", THREAD_COLUMNS),
            params![id],
            thread_from_row,
        )
        .optional()
        .map_err(|e| Error::storage("Failed to get thread", e))
    }

    fn list_threads(&self, limit: Option<u32>) -> Result<Vec<ThreadRecord>> {
        let conn = self.lock()?;

        let query = match limit {
            Some(n) => format!(
                "SELECT {} FROM threads ORDER BY updated_at DESC LIMIT {}",
                THREAD_COLUMNS, n
            ),
            None => format!(
                "SELECT {} FROM threads ORDER BY updated_at DESC",
                THREAD_COLUMNS
            ),
        };

        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| Error::storage("Failed to prepare query", e))?;

        let threads = stmt
            .query_map([], thread_from_row)
            .map_err(|e| Error::storage("Failed to query threads", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage("Failed to read thread row", e))?;

        Ok(threads)
    }

    fn get_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![id],
            task_from_row,
        )
        .optional()
        .map_err(|e| Error::storage("Failed to get task", e))
    }

    fn begin_iteration(&self, task_id: &str, iteration: u32) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                r#"
                UPDATE tasks SET
                    current_iteration = ?2,
                    status = 'running',
                    updated_at = ?3
                WHERE id = ?1 AND ?2 <= max_iterations AND ?2 > current_iteration
                "#,
                params![task_id, iteration, now_rfc3339()],
            )
            .map_err(|e| Error::storage("Failed to begin iteration", e))?;

        if updated == 0 {
            return Err(Error::Task(format!(
                "Cannot move task {} to iteration {}",
                task_id, iteration
            )));
        }

        Ok(())
    }

    fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn
            .execute(
                "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![task_id, status.as_str(), now_rfc3339()],
            )
            .map_err(|e| Error::storage("Failed to update task status", e))?;

        if updated == 0 {
            return Err(Error::TaskNotFound(task_id.to_string()));
        }

        Ok(())
    }

    fn finish_task(&self, task_id: &str, status: TaskStatus, result: Option<&str>) -> Result<()> {
        let thread_status = match status {
            TaskStatus::Completed => ThreadStatus::Completed,
            TaskStatus::Failed => ThreadStatus::Failed,
            other => {
                return Err(Error::InvalidInput(format!(
                    "'{}' is not a terminal task status",
                    other
                )))
            }
        };
        let result = if status == TaskStatus::Completed {
            result
        } else {
            None
        };
        let now = now_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage("Failed to begin transaction", e))?;

        let updated = tx
            .execute(
                r#"
                UPDATE tasks SET
                    status = ?2,
                    result = ?3,
                    completed_at = ?4,
                    updated_at = ?4
                WHERE id = ?1
                "#,
                params![task_id, status.as_str(), result, now],
            )
            .map_err(|e| Error::storage("Failed to finish task", e))?;

        if updated == 0 {
            return Err(Error::TaskNotFound(task_id.to_string()));
        }

        tx.execute(
            r#"
            UPDATE threads SET status = ?2, updated_at = ?3
            WHERE id = (SELECT thread_id FROM tasks WHERE id = ?1)
            "#,
            params![task_id, thread_status.as_str(), now],
        )
        .map_err(|e| Error::storage("Failed to finish task thread", e))?;

        tx.commit()
            .map_err(|e| Error::storage("Failed to commit task completion", e))?;

        Ok(())
    }

    fn append_message(&self, message: &MessageRecord) -> Result<()> {
        let conn = self.lock()?;
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            r#"
            INSERT INTO messages (id, thread_id, role, content, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                message.id,
                message.thread_id,
                message.role.as_str(),
                message.content,
                metadata,
                message.created_at,
            ],
        )
        .map_err(|e| Error::storage("Failed to save message", e))?;

        // Touch thread
        conn.execute(
            "UPDATE threads SET updated_at = ?2 WHERE id = ?1",
            params![message.thread_id, now_rfc3339()],
        )
        .ok();

        Ok(())
    }

    fn get_messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, thread_id, role, content, metadata, created_at
                FROM messages
                WHERE thread_id = ?1
                ORDER BY created_at ASC, rowid ASC
                "#,
            )
            .map_err(|e| Error::storage("Failed to prepare query", e))?;

        let messages = stmt
            .query_map(params![thread_id], message_from_row)
            .map_err(|e| Error::storage("Failed to query messages", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage("Failed to read message row", e))?;

        Ok(messages)
    }

    fn record_agent_run(&self, run: &AgentRunRecord, metrics: &[UsageMetricRecord]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::storage("Failed to begin transaction", e))?;

        tx.execute(
            r#"
            INSERT INTO agent_runs (id, task_id, thread_id, model, input_tokens, output_tokens,
                                    cost_estimate, duration_ms, status, error, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                run.id,
                run.task_id,
                run.thread_id,
                run.model,
                run.input_tokens as i64,
                run.output_tokens as i64,
                run.cost_estimate,
                run.duration_ms as i64,
                run.status.as_str(),
                run.error,
                run.completed_at,
            ],
        )
        .map_err(|e| Error::storage("Failed to record agent run", e))?;

        for metric in metrics {
            tx.execute(
                r#"
                INSERT INTO usage_metrics (run_id, name, value, model, recorded_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    metric.run_id,
                    metric.name,
                    metric.value,
                    metric.model,
                    metric.recorded_at,
                ],
            )
            .map_err(|e| Error::storage("Failed to record usage metric", e))?;
        }

        tx.commit()
            .map_err(|e| Error::storage("Failed to commit agent run", e))?;

        Ok(())
    }

    fn get_agent_runs(&self, task_id: &str) -> Result<Vec<AgentRunRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, task_id, thread_id, model, input_tokens, output_tokens,
                       cost_estimate, duration_ms, status, error, completed_at
                FROM agent_runs
                WHERE task_id = ?1
                ORDER BY completed_at ASC, rowid ASC
                "#,
            )
            .map_err(|e| Error::storage("Failed to prepare query", e))?;

        let runs = stmt
            .query_map(params![task_id], agent_run_from_row)
            .map_err(|e| Error::storage("Failed to query agent runs", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage("Failed to read agent run row", e))?;

        Ok(runs)
    }

    fn get_usage_metrics(&self, run_id: &str) -> Result<Vec<UsageMetricRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, run_id, name, value, model, recorded_at
                FROM usage_metrics
                WHERE run_id = ?1
                ORDER BY id ASC
                "#,
            )
            .map_err(|e| Error::storage("Failed to prepare query", e))?;

        let metrics = stmt
            .query_map(params![run_id], |row| {
                Ok(UsageMetricRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    name: row.get(2)?,
                    value: row.get(3)?,
                    model: row.get(4)?,
                    recorded_at: row.get(5)?,
                })
            })
            .map_err(|e| Error::storage("Failed to query usage metrics", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::storage("Failed to read usage metric row", e))?;

        Ok(metrics)
    }
}
