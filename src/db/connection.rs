use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the audit thread. Dropping the last handle closes the task channel,
/// which ends the thread's receive loop.
struct AuditWorker {
    tasks: Option<mpsc::Sender<DbTask>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for AuditWorker {
    fn drop(&mut self) {
        self.tasks.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("audit DB thread panicked before shutdown");
            }
        }
    }
}

/// Handle to the call-log database.
///
/// One thread owns the SQLite connection; async callers hand it closures
/// and await a oneshot reply.
#[derive(Clone)]
pub struct Database {
    worker: Arc<AuditWorker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let path = db_path.clone();

        let thread = thread::Builder::new()
            .name("ivr-audit-db".into())
            .spawn(move || {
                let opened = Connection::open(&path)
                    .context("failed to open SQLite database")
                    .and_then(|mut conn| {
                        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                            error!("failed to enable WAL mode: {err}");
                        }
                        run_migrations(&mut conn).context("failed to run database migrations")?;
                        Ok(conn)
                    });

                let mut conn = match opened {
                    Ok(conn) => {
                        let _ = ready_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Ok(task) = task_rx.recv() {
                    task(&mut conn);
                }
                info!("audit database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;
        info!("audit database initialized at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(AuditWorker {
                tasks: Some(task_tx),
                thread: Some(thread),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let tasks = self
            .worker
            .tasks
            .as_ref()
            .ok_or_else(|| anyhow!("audit database is shut down"))?;

        tasks
            .send(Box::new(move |conn| {
                let _ = reply_tx.send(task(conn));
            }))
            .map_err(|_| anyhow!("audit database thread is gone"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("audit database thread dropped the reply"))?
    }
}
