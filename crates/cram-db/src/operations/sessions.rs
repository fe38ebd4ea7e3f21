//! Session CRUD operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use cram_core::{Preferences, Session, SessionId, SessionResults, SessionStatus};
use rusqlite::{params, Row};

/// Lightweight row for session listings.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: SessionId,
    pub user_id: String,
    pub status: SessionStatus,
    pub file_count: usize,
    pub created_at: DateTime<Utc>,
}

const SESSION_COLUMNS: &str = "id, user_id, files, preferences, status, summary, flashcards, \
     study_guide, total_text_length, total_chunks, successful_files, processing_errors, \
     error_message, created_at, processed_at";

fn read_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    let files_json: String = row.get(2)?;
    let preferences_json: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let flashcards_json: String = row.get(6)?;
    let successful_json: String = row.get(10)?;
    let errors_json: Option<String> = row.get(11)?;
    let created_at_str: String = row.get(13)?;
    let processed_at_str: Option<String> = row.get(14)?;

    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        files: serde_json::from_str(&files_json).unwrap_or_default(),
        preferences: serde_json::from_str::<Preferences>(&preferences_json).unwrap_or_default(),
        status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Pending),
        error_message: row.get(12)?,
        results: SessionResults {
            summary: row.get(5)?,
            flashcards: serde_json::from_str(&flashcards_json).unwrap_or_default(),
            study_guide: row.get(7)?,
            total_text_length: row.get(8)?,
            total_chunks: row.get(9)?,
            successful_files: serde_json::from_str(&successful_json).unwrap_or_default(),
            processing_errors: errors_json.and_then(|s| serde_json::from_str(&s).ok()),
        },
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        processed_at: processed_at_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
    })
}

impl Database {
    /// Create a new session.
    pub fn create_session(&self, session: &Session) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO sessions (id, user_id, files, preferences, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                session.id,
                session.user_id,
                serde_json::to_string(&session.files)?,
                serde_json::to_string(&session.preferences)?,
                session.status.as_str(),
                session.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: &str) -> DbResult<Session> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
            params![id],
            read_session,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Session not found: {}", id))
            }
            _ => DbError::from(e),
        })
    }

    /// Update only the session status.
    ///
    /// Rejects non-monotonic transitions: once a session is terminal no
    /// further status write is accepted.
    pub fn update_session_status(&self, id: &str, next: SessionStatus) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = current_status(&tx, id)?;
        if !current.can_transition_to(next) {
            return Err(DbError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        tx.execute(
            "UPDATE sessions SET status = ?2 WHERE id = ?1",
            params![id, next.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Write the terminal status and all result fields in one update.
    ///
    /// Partial by design: files, preferences, and created_at are untouched.
    pub fn update_session_results(
        &self,
        id: &str,
        status: SessionStatus,
        results: &SessionResults,
    ) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = current_status(&tx, id)?;
        if !current.can_transition_to(status) {
            return Err(DbError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let processing_errors = results
            .processing_errors
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            r#"
            UPDATE sessions
            SET status = ?2, summary = ?3, flashcards = ?4, study_guide = ?5,
                total_text_length = ?6, total_chunks = ?7, successful_files = ?8,
                processing_errors = ?9, processed_at = ?10
            WHERE id = ?1
            "#,
            params![
                id,
                status.as_str(),
                results.summary,
                serde_json::to_string(&results.flashcards)?,
                results.study_guide,
                results.total_text_length,
                results.total_chunks,
                serde_json::to_string(&results.successful_files)?,
                processing_errors,
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Record a fatal failure: status `failed` plus the captured message.
    pub fn mark_session_failed(&self, id: &str, message: &str) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = current_status(&tx, id)?;
        if !current.can_transition_to(SessionStatus::Failed) {
            return Err(DbError::InvalidTransition {
                from: current,
                to: SessionStatus::Failed,
            });
        }

        tx.execute(
            "UPDATE sessions SET status = 'failed', error_message = ?2, processed_at = ?3 WHERE id = ?1",
            params![id, message, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// List the most recently created sessions.
    pub fn list_recent_sessions(&self, limit: i64) -> DbResult<Vec<SessionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, files, status, created_at FROM sessions \
             ORDER BY created_at DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let files_json: String = row.get(2)?;
            let status_str: String = row.get(3)?;
            let created_at_str: String = row.get(4)?;
            Ok(SessionSummary {
                id: row.get(0)?,
                user_id: row.get(1)?,
                status: SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Pending),
                file_count: serde_json::from_str::<Vec<serde_json::Value>>(&files_json)
                    .map(|v| v.len())
                    .unwrap_or(0),
                created_at: DateTime::parse_from_rfc3339(&created_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn current_status(tx: &rusqlite::Transaction<'_>, id: &str) -> DbResult<SessionStatus> {
    let status_str: String = tx
        .query_row(
            "SELECT status FROM sessions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Session not found: {}", id))
            }
            _ => DbError::from(e),
        })?;

    Ok(SessionStatus::from_str(&status_str).unwrap_or(SessionStatus::Pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cram_core::FileRef;

    fn sample_session() -> Session {
        Session::new("user-1")
            .with_file(FileRef::new(
                "lecture.pdf",
                "https://files.example/lecture.pdf",
                "application/pdf",
                2048,
            ))
            .with_file(FileRef::new(
                "notes.txt",
                "https://files.example/notes.txt",
                "text/plain",
                128,
            ))
    }

    #[test]
    fn test_create_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let session = sample_session();
        db.create_session(&session).unwrap();

        let loaded = db.get_session(&session.id).unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.status, SessionStatus::Pending);
        assert_eq!(loaded.files.len(), 2);
        assert_eq!(loaded.files[0].file_name, "lecture.pdf");
    }

    #[test]
    fn test_get_missing_session() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_session("missing"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_status_updates_are_monotonic() {
        let db = Database::open_in_memory().unwrap();
        let session = sample_session();
        db.create_session(&session).unwrap();

        db.update_session_status(&session.id, SessionStatus::Processing)
            .unwrap();
        // Idempotent re-run
        db.update_session_status(&session.id, SessionStatus::Processing)
            .unwrap();
        db.update_session_status(&session.id, SessionStatus::Completed)
            .unwrap();

        // Terminal: nothing further is accepted
        let err = db
            .update_session_status(&session.id, SessionStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));

        let err = db.mark_session_failed(&session.id, "too late").unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));
    }

    #[test]
    fn test_update_results_preserves_unrelated_fields() {
        let db = Database::open_in_memory().unwrap();
        let session = sample_session();
        db.create_session(&session).unwrap();
        db.update_session_status(&session.id, SessionStatus::Processing)
            .unwrap();

        let results = SessionResults {
            summary: Some("A short summary".to_string()),
            flashcards: vec![cram_core::Flashcard {
                question: "Q".to_string(),
                answer: "A".to_string(),
            }],
            study_guide: None,
            total_text_length: 4242,
            total_chunks: 7,
            successful_files: vec!["lecture.pdf".to_string()],
            processing_errors: Some(vec!["notes.txt: download failed".to_string()]),
        };

        db.update_session_results(&session.id, SessionStatus::CompletedWithErrors, &results)
            .unwrap();

        let loaded = db.get_session(&session.id).unwrap();
        assert_eq!(loaded.status, SessionStatus::CompletedWithErrors);
        assert_eq!(loaded.results.summary.as_deref(), Some("A short summary"));
        assert_eq!(loaded.results.flashcards.len(), 1);
        assert_eq!(loaded.results.total_chunks, 7);
        assert_eq!(
            loaded.results.processing_errors,
            Some(vec!["notes.txt: download failed".to_string()])
        );
        // Unrelated fields untouched
        assert_eq!(loaded.files.len(), 2);
        assert!(loaded.processed_at.is_some());
    }

    #[test]
    fn test_mark_failed_from_pending() {
        let db = Database::open_in_memory().unwrap();
        let session = sample_session();
        db.create_session(&session).unwrap();

        db.mark_session_failed(&session.id, "unauthorized access")
            .unwrap();

        let loaded = db.get_session(&session.id).unwrap();
        assert_eq!(loaded.status, SessionStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("unauthorized access"));
    }

    #[test]
    fn test_list_recent_sessions() {
        let db = Database::open_in_memory().unwrap();
        for _ in 0..3 {
            db.create_session(&sample_session()).unwrap();
        }

        let recent = db.list_recent_sessions(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].file_count, 2);
    }
}
