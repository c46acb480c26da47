use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_timestamp, parse_datetime, parse_uuid, to_i64},
    models::{CallLog, CallLogPage},
};

const SELECT_COLUMNS: &str =
    "SELECT id, call_id, caller_number, menu_path, digit_pressed, current_menu_id, timestamp
     FROM call_logs";

fn row_to_call_log(row: &Row) -> Result<CallLog> {
    let id: String = row.get("id")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(CallLog {
        id: parse_uuid(&id, "id")?,
        call_id: row.get("call_id")?,
        caller_number: row.get("caller_number")?,
        menu_path: row.get("menu_path")?,
        digit_pressed: row.get("digit_pressed")?,
        current_menu_id: row.get("current_menu_id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
    })
}

fn collect_rows(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<CallLog>> {
    let mut logs = Vec::new();
    while let Some(row) = rows.next()? {
        logs.push(row_to_call_log(row)?);
    }
    Ok(logs)
}

impl Database {
    pub async fn insert_call_log(&self, log: &CallLog) -> Result<()> {
        let record = log.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO call_logs (id, call_id, caller_number, menu_path, digit_pressed, current_menu_id, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.call_id,
                    record.caller_number,
                    record.menu_path,
                    record.digit_pressed,
                    record.current_menu_id,
                    format_timestamp(&record.timestamp),
                ],
            )
            .with_context(|| format!("failed to insert call log for call {}", record.call_id))?;
            Ok(())
        })
        .await
    }

    /// Newest first.
    pub async fn list_call_logs(&self, skip: usize, take: usize) -> Result<Vec<CallLog>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let mut rows = stmt.query(params![to_i64(take)?, to_i64(skip)?])?;
            collect_rows(&mut rows)
        })
        .await
    }

    pub async fn count_call_logs(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM call_logs", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    pub async fn call_log_page(&self, skip: usize, take: usize) -> Result<CallLogPage> {
        let call_logs = self.list_call_logs(skip, take).await?;
        let total_count = self.count_call_logs().await?;
        Ok(CallLogPage {
            call_logs,
            total_count,
            skip,
            take,
        })
    }

    /// Every interaction for one call, in the order it happened.
    pub async fn call_logs_for_call(&self, call_id: &str) -> Result<Vec<CallLog>> {
        let call_id = call_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE call_id = ?1
                 ORDER BY timestamp ASC, rowid ASC"
            ))?;
            let mut rows = stmt.query(params![call_id])?;
            collect_rows(&mut rows)
        })
        .await
    }

    /// Newest first.
    pub async fn call_logs_for_caller(&self, caller_number: &str) -> Result<Vec<CallLog>> {
        let caller_number = caller_number.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE caller_number = ?1
                 ORDER BY timestamp DESC, rowid DESC"
            ))?;
            let mut rows = stmt.query(params![caller_number])?;
            collect_rows(&mut rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::call::CallerIdentity;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
    }

    fn log(call_id: &str, caller: &str, digit: &str, menu: &str, at: i64) -> CallLog {
        CallLog::new(
            call_id,
            &CallerIdentity::parse(caller).unwrap(),
            format!("MAIN > {menu}"),
            digit,
            menu,
            t(at),
        )
    }

    async fn seeded() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("audit.sqlite3")).unwrap();
        db.insert_call_log(&log("C1", "+15551234567", "INCOMING", "MAIN", 0))
            .await
            .unwrap();
        db.insert_call_log(&log("C1", "+15551234567", "1", "SALES", 5))
            .await
            .unwrap();
        db.insert_call_log(&log("C2", "+15559876543", "INCOMING", "MAIN", 10))
            .await
            .unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn insert_and_read_back_exactly() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("audit.sqlite3")).unwrap();
        let entry = log("C1", "+15551234567", "2", "SUPPORT", 3);
        db.insert_call_log(&entry).await.unwrap();

        let logs = db.call_logs_for_call("C1").await.unwrap();
        assert_eq!(logs, vec![entry]);
    }

    #[tokio::test]
    async fn lists_newest_first_with_paging() {
        let (_dir, db) = seeded().await;

        let all = db.list_call_logs(0, 50).await.unwrap();
        let calls: Vec<_> = all.iter().map(|l| l.call_id.as_str()).collect();
        assert_eq!(calls, vec!["C2", "C1", "C1"]);

        let page = db.call_log_page(1, 1).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.call_logs.len(), 1);
        assert_eq!(page.call_logs[0].current_menu_id, "SALES");
        assert_eq!((page.skip, page.take), (1, 1));
    }

    #[tokio::test]
    async fn filters_by_call_and_caller() {
        let (_dir, db) = seeded().await;

        let c1 = db.call_logs_for_call("C1").await.unwrap();
        let digits: Vec<_> = c1.iter().map(|l| l.digit_pressed.as_str()).collect();
        assert_eq!(digits, vec!["INCOMING", "1"]);

        let by_caller = db.call_logs_for_caller("+15551234567").await.unwrap();
        assert_eq!(by_caller.len(), 2);
        assert_eq!(by_caller[0].digit_pressed, "1");

        assert!(db.call_logs_for_call("missing").await.unwrap().is_empty());
        assert_eq!(db.count_call_logs().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let (dir, db) = seeded().await;
        let path = db.path().to_path_buf();
        drop(db);

        let reopened = Database::new(path).unwrap();
        assert_eq!(reopened.count_call_logs().await.unwrap(), 3);
        drop(dir);
    }
}
