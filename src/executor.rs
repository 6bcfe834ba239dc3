//! Migration executor with statement-level progress tracking.
//!
//! The first run against a server creates the `housekeeper` database and
//! the `housekeeper.revisions` table. Both are shard-local by design and
//! are never created `ON CLUSTER`: every shard tracks its own progress.
//!
//! Progress rows are append-only; the newest row for a version is the
//! authoritative state. Resume validates that the already-applied prefix of
//! per-statement hashes is unchanged before continuing, so an edited
//! migration can never silently diverge from what was executed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use crate::client::ClickHouseExec;
use crate::error::{Result, integrity_error, runtime_error};
use crate::format::escape_string;
use crate::migration::Migration;

pub const REVISIONS_DATABASE: &str = "housekeeper";
pub const REVISIONS_TABLE: &str = "housekeeper.revisions";

const CREATE_REVISIONS_DATABASE: &str = "CREATE DATABASE IF NOT EXISTS housekeeper";

const CREATE_REVISIONS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS housekeeper.revisions
(
    `version` String,
    `executed_at` DateTime,
    `execution_time_ms` UInt64,
    `kind` Enum('migration' = 1, 'snapshot' = 2),
    `applied` UInt32,
    `total` UInt32,
    `error` Nullable(String),
    `hash` String,
    `partial_hashes` Array(String),
    `housekeeper_version` String
)
ENGINE = MergeTree()
ORDER BY (version, executed_at, applied)";

/// One attempt to run one migration, as recorded in the revisions table.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub version:             String,
    pub executed_at:         DateTime<Utc>,
    pub execution_time_ms:   u64,
    pub kind:                RevisionKind,
    pub applied:             u32,
    pub total:               u32,
    pub error:               Option<String>,
    pub hash:                String,
    pub partial_hashes:      Vec<String>,
    pub housekeeper_version: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
    Migration,
    Snapshot
}

impl RevisionKind {
    fn as_str(&self) -> &'static str {
        match self {
            RevisionKind::Migration => "migration",
            RevisionKind::Snapshot => "snapshot"
        }
    }

    fn parse(text: &str) -> Self {
        match text {
            "snapshot" => RevisionKind::Snapshot,
            _ => RevisionKind::Migration
        }
    }
}

/// Result of applying one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Hashes matched a fully applied revision; nothing ran.
    AlreadyApplied,
    /// Statements `first..total` ran to completion.
    Applied { executed: usize },
    /// The cancel signal was observed between statements.
    Cancelled { applied: usize }
}

/// Where to pick up a migration, derived from its latest revision.
#[derive(Debug, PartialEq, Eq)]
enum ResumePoint {
    Skip,
    StartAt(usize)
}

/// Pure resume protocol: decides whether and where to run, or fails with an
/// integrity error when the file no longer matches the recorded hashes.
fn resume_point(migration: &Migration, latest: Option<&Revision>) -> Result<ResumePoint> {
    let total = migration.statements.len() as u32;
    let Some(revision) = latest else {
        return Ok(ResumePoint::StartAt(0));
    };

    if revision.applied == revision.total {
        if revision.hash == migration.hash() && revision.total == total {
            return Ok(ResumePoint::Skip);
        }
        return Err(integrity_error(format!(
            "migration {} was edited after it was applied",
            migration.version
        )));
    }

    if revision.total != total {
        return Err(integrity_error(format!(
            "migration {} changed statement count ({} recorded, {} on disk)",
            migration.version, revision.total, total
        )));
    }
    let partial = migration.partial_hashes();
    let applied = revision.applied as usize;
    if revision.partial_hashes.len() < applied
        || partial[..applied] != revision.partial_hashes[..applied]
    {
        return Err(integrity_error(format!(
            "migration {} was edited in its already-applied prefix",
            migration.version
        )));
    }
    Ok(ResumePoint::StartAt(applied))
}

/// Progress callback: (version, applied, total), invoked between statements.
pub type ProgressFn = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

pub struct Executor<'a, C: ClickHouseExec> {
    client:   &'a C,
    cancel:   Option<Arc<AtomicBool>>,
    progress: Option<ProgressFn>
}

impl<'a, C: ClickHouseExec> Executor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            cancel: None,
            progress: None
        }
    }

    /// Cooperative cancellation, observed between statements only.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    fn report(&self, version: &str, applied: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(version, applied, total);
        }
    }

    /// Create the tracking namespace if needed. Shard-local, no cluster.
    pub async fn ensure_revisions_table(&self) -> Result<()> {
        self.client.exec(CREATE_REVISIONS_DATABASE).await?;
        self.client.exec(CREATE_REVISIONS_TABLE).await?;
        Ok(())
    }

    /// Most recent revision row for a version.
    pub async fn latest_revision(&self, version: &str) -> Result<Option<Revision>> {
        let sql = format!(
            "SELECT version, executed_at, execution_time_ms, kind, applied, total, error, \
             hash, partial_hashes, housekeeper_version \
             FROM {} WHERE version = '{}' \
             ORDER BY executed_at DESC, applied DESC LIMIT 1",
            REVISIONS_TABLE,
            escape_string(version)
        );
        let rows = self.client.query(&sql).await?;
        match rows.into_iter().next() {
            None => Ok(None),
            Some(row) => Ok(Some(parse_revision_row(row)?))
        }
    }

    /// All revisions, newest row per version.
    pub async fn revisions(&self) -> Result<Vec<Revision>> {
        let sql = format!(
            "SELECT version, executed_at, execution_time_ms, kind, applied, total, error, \
             hash, partial_hashes, housekeeper_version \
             FROM {} ORDER BY version, executed_at DESC, applied DESC LIMIT 1 BY version",
            REVISIONS_TABLE
        );
        let rows = self.client.query(&sql).await?;
        rows.into_iter().map(parse_revision_row).collect()
    }

    async fn record(&self, revision: &Revision) -> Result<()> {
        let row = serde_json::json!({
            "version": revision.version,
            "executed_at": revision.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "execution_time_ms": revision.execution_time_ms,
            "kind": revision.kind.as_str(),
            "applied": revision.applied,
            "total": revision.total,
            "error": revision.error,
            "hash": revision.hash,
            "partial_hashes": revision.partial_hashes,
            "housekeeper_version": revision.housekeeper_version,
        });
        let sql = format!("INSERT INTO {} FORMAT JSONEachRow\n{}", REVISIONS_TABLE, row);
        self.client.exec(&sql).await
    }

    /// Apply one migration, resuming a prior partial run if one exists.
    pub async fn apply(&self, migration: &Migration) -> Result<ApplyOutcome> {
        let latest = self.latest_revision(&migration.version).await?;
        let start = match resume_point(migration, latest.as_ref())? {
            ResumePoint::Skip => {
                debug!(version = %migration.version, "already applied, skipping");
                return Ok(ApplyOutcome::AlreadyApplied);
            }
            ResumePoint::StartAt(start) => start
        };

        let total = migration.statements.len();
        let partial_hashes = migration.partial_hashes();
        let started = Instant::now();
        let mut revision = Revision {
            version:             migration.version.clone(),
            executed_at:         Utc::now(),
            execution_time_ms:   0,
            kind:                RevisionKind::Migration,
            applied:             start as u32,
            total:               total as u32,
            error:               None,
            hash:                migration.hash(),
            partial_hashes:      partial_hashes.clone(),
            housekeeper_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        if start > 0 {
            info!(version = %migration.version, start, total, "resuming migration");
        } else {
            info!(version = %migration.version, total, "applying migration");
        }

        for (i, statement) in migration.statements.iter().enumerate().skip(start) {
            if self.cancelled() {
                revision.execution_time_ms = started.elapsed().as_millis() as u64;
                self.record(&revision).await?;
                warn!(version = %migration.version, applied = i, "cancelled between statements");
                return Ok(ApplyOutcome::Cancelled { applied: i });
            }
            let sql = statement.to_string();
            if let Err(err) = self.client.exec(&sql).await {
                revision.applied = i as u32;
                revision.error = Some(err.to_string());
                revision.execution_time_ms = started.elapsed().as_millis() as u64;
                self.record(&revision).await?;
                return Err(runtime_error(format!(
                    "migration {} failed at statement {}/{}: {}",
                    migration.version,
                    i + 1,
                    total,
                    err
                )));
            }
            revision.applied = (i + 1) as u32;
            revision.error = None;
            revision.execution_time_ms = started.elapsed().as_millis() as u64;
            self.record(&revision).await?;
            self.report(&migration.version, i + 1, total);
        }

        Ok(ApplyOutcome::Applied {
            executed: total - start
        })
    }

    /// Apply migrations in version order, stopping at the first failure.
    pub async fn apply_all(&self, migrations: &[Migration]) -> Result<Vec<(String, ApplyOutcome)>> {
        self.ensure_revisions_table().await?;
        let mut outcomes = Vec::new();
        for migration in migrations {
            let outcome = self.apply(migration).await?;
            let stop = matches!(outcome, ApplyOutcome::Cancelled { .. });
            outcomes.push((migration.version.clone(), outcome));
            if stop {
                break;
            }
        }
        Ok(outcomes)
    }
}

fn parse_revision_row(row: Vec<String>) -> Result<Revision> {
    if row.len() != 10 {
        return Err(runtime_error(format!(
            "revisions table returned {} columns, expected 10",
            row.len()
        )));
    }
    let executed_at = NaiveDateTime::parse_from_str(&row[1], "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now());
    let partial_hashes: Vec<String> = serde_json::from_str(&row[8])
        .map_err(|e| runtime_error(format!("cannot decode partial_hashes: {}", e)))?;
    Ok(Revision {
        version: row[0].clone(),
        executed_at,
        execution_time_ms: row[2].parse().unwrap_or_default(),
        kind: RevisionKind::parse(&row[3]),
        applied: row[4]
            .parse()
            .map_err(|e| runtime_error(format!("bad applied column: {}", e)))?,
        total: row[5]
            .parse()
            .map_err(|e| runtime_error(format!("bad total column: {}", e)))?,
        error: if row[6].is_empty() {
            None
        } else {
            Some(row[6].clone())
        },
        hash: row[7].clone(),
        partial_hashes,
        housekeeper_version: row[9].clone()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in for a ClickHouse server: executes statements into
    /// a log, stores revision inserts, and serves revision lookups.
    #[derive(Default)]
    struct FakeServer {
        executed:  Mutex<Vec<String>>,
        revisions: Mutex<Vec<Revision>>,
        fail_on:   Mutex<Option<String>>
    }

    impl FakeServer {
        fn executed_ddl(&self) -> Vec<String> {
            self.executed
                .lock()
                .unwrap()
                .iter()
                .filter(|sql| !sql.starts_with("CREATE DATABASE IF NOT EXISTS housekeeper"))
                .filter(|sql| !sql.starts_with("CREATE TABLE IF NOT EXISTS housekeeper"))
                .filter(|sql| !sql.starts_with("INSERT INTO"))
                .cloned()
                .collect()
        }

        fn fail_on(&self, marker: &str) {
            *self.fail_on.lock().unwrap() = Some(marker.to_string());
        }

        fn clear_failure(&self) {
            *self.fail_on.lock().unwrap() = None;
        }

        fn store_revision(&self, body: &str) {
            let value: serde_json::Value = serde_json::from_str(body).unwrap();
            let revision = Revision {
                version: value["version"].as_str().unwrap().to_string(),
                executed_at: NaiveDateTime::parse_from_str(
                    value["executed_at"].as_str().unwrap(),
                    "%Y-%m-%d %H:%M:%S"
                )
                .unwrap()
                .and_utc(),
                execution_time_ms: value["execution_time_ms"].as_u64().unwrap(),
                kind: RevisionKind::parse(value["kind"].as_str().unwrap()),
                applied: value["applied"].as_u64().unwrap() as u32,
                total: value["total"].as_u64().unwrap() as u32,
                error: value["error"].as_str().map(|s| s.to_string()),
                hash: value["hash"].as_str().unwrap().to_string(),
                partial_hashes: value["partial_hashes"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|v| v.as_str().unwrap().to_string())
                    .collect(),
                housekeeper_version: value["housekeeper_version"].as_str().unwrap().to_string()
            };
            self.revisions.lock().unwrap().push(revision);
        }

        fn revision_row(revision: &Revision) -> Vec<String> {
            vec![
                revision.version.clone(),
                revision.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                revision.execution_time_ms.to_string(),
                revision.kind.as_str().to_string(),
                revision.applied.to_string(),
                revision.total.to_string(),
                revision.error.clone().unwrap_or_default(),
                revision.hash.clone(),
                serde_json::to_string(&revision.partial_hashes).unwrap(),
                revision.housekeeper_version.clone(),
            ]
        }
    }

    impl ClickHouseExec for FakeServer {
        async fn exec(&self, sql: &str) -> Result<()> {
            if let Some(body) = sql.strip_prefix(&format!(
                "INSERT INTO {} FORMAT JSONEachRow\n",
                REVISIONS_TABLE
            )) {
                self.store_revision(body);
                self.executed.lock().unwrap().push(sql.to_string());
                return Ok(());
            }
            if let Some(marker) = self.fail_on.lock().unwrap().as_ref() {
                if sql.contains(marker.as_str()) {
                    return Err(runtime_error(format!("server rejected: {}", marker)));
                }
            }
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(())
        }

        async fn query(&self, sql: &str) -> Result<Vec<Vec<String>>> {
            let revisions = self.revisions.lock().unwrap();
            if let Some(rest) = sql.split("WHERE version = '").nth(1) {
                let version = rest.split('\'').next().unwrap_or_default();
                let latest = revisions
                    .iter()
                    .filter(|r| r.version == version)
                    .next_back();
                return Ok(latest.map(Self::revision_row).into_iter().collect());
            }
            Ok(Vec::new())
        }
    }

    fn migration(version: &str, sql: &str) -> Migration {
        Migration::parse(version, sql).unwrap()
    }

    const FIVE: &str = "CREATE DATABASE d1;\nCREATE DATABASE d2;\nCREATE DATABASE d3;\n\
                        CREATE DATABASE d4;\nCREATE DATABASE d5;";

    #[tokio::test]
    async fn applies_all_statements_and_records_progress() {
        let server = FakeServer::default();
        let executor = Executor::new(&server);
        let outcome = executor
            .apply_all(&[migration("20240101000000", FIVE)])
            .await
            .unwrap();
        assert_eq!(outcome[0].1, ApplyOutcome::Applied { executed: 5 });
        assert_eq!(server.executed_ddl().len(), 5);

        let latest = executor.latest_revision("20240101000000").await.unwrap().unwrap();
        assert_eq!(latest.applied, 5);
        assert_eq!(latest.total, 5);
        assert_eq!(latest.error, None);
        assert_eq!(latest.partial_hashes.len(), 5);
    }

    #[tokio::test]
    async fn second_run_skips() {
        let server = FakeServer::default();
        let executor = Executor::new(&server);
        let m = migration("20240101000000", FIVE);
        executor.apply_all(std::slice::from_ref(&m)).await.unwrap();
        let before = server.executed_ddl().len();

        let outcome = executor.apply(&m).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
        assert_eq!(server.executed_ddl().len(), before);
    }

    #[tokio::test]
    async fn failure_persists_partial_progress_then_resume_finishes() {
        let server = FakeServer::default();
        let executor = Executor::new(&server);
        let m = migration("20240101000000", FIVE);

        // Statement 4 fails; statements 1-3 are recorded as applied.
        server.fail_on("d4");
        let err = executor.apply_all(std::slice::from_ref(&m)).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let latest = executor.latest_revision("20240101000000").await.unwrap().unwrap();
        assert_eq!(latest.applied, 3);
        assert_eq!(latest.total, 5);
        assert!(latest.error.as_deref().unwrap().contains("d4"));

        // The cause is fixed; the rerun executes exactly statements 4 and 5.
        server.clear_failure();
        let before = server.executed_ddl().len();
        let outcome = executor.apply(&m).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { executed: 2 });
        assert_eq!(server.executed_ddl().len() - before, 2);

        let latest = executor.latest_revision("20240101000000").await.unwrap().unwrap();
        assert_eq!(latest.applied, 5);
        assert_eq!(latest.error, None);
    }

    #[tokio::test]
    async fn editing_applied_prefix_is_integrity_error() {
        let server = FakeServer::default();
        let executor = Executor::new(&server);
        let m = migration("20240101000000", FIVE);
        server.fail_on("d4");
        let _ = executor.apply_all(std::slice::from_ref(&m)).await;
        server.clear_failure();

        // Statement 1 edited between runs.
        let edited = migration("20240101000000", &FIVE.replace("d1", "dX"));
        let err = executor.apply(&edited).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn editing_after_full_apply_is_integrity_error() {
        let server = FakeServer::default();
        let executor = Executor::new(&server);
        let m = migration("20240101000000", FIVE);
        executor.apply_all(std::slice::from_ref(&m)).await.unwrap();

        let edited = migration("20240101000000", &FIVE.replace("d5", "dX"));
        let err = executor.apply(&edited).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn cancel_between_statements_persists_partial_state() {
        let server = FakeServer::default();
        let cancel = Arc::new(AtomicBool::new(false));
        let executor = Executor::new(&server).with_cancel(Arc::clone(&cancel));
        // Pre-cancelled: the executor must stop before statement one.
        cancel.store(true, Ordering::Relaxed);
        let outcome = executor
            .apply_all(&[migration("20240101000000", FIVE)])
            .await
            .unwrap();
        assert_eq!(outcome[0].1, ApplyOutcome::Cancelled { applied: 0 });
        assert!(server.executed_ddl().is_empty());
    }

    #[test]
    fn resume_point_statement_count_change_is_integrity_error() {
        let m = migration("1", "CREATE DATABASE a;\nCREATE DATABASE b;");
        let recorded = Revision {
            version: "1".into(),
            executed_at: Utc::now(),
            execution_time_ms: 0,
            kind: RevisionKind::Migration,
            applied: 1,
            total: 3,
            error: Some("x".into()),
            hash: "h1:old".into(),
            partial_hashes: m.partial_hashes(),
            housekeeper_version: "0".into()
        };
        assert!(resume_point(&m, Some(&recorded)).is_err());
    }
}
