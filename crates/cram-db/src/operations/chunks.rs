//! Chunk storage operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use cram_core::ChunkRecord;
use rusqlite::params;

impl Database {
    /// Replace all chunks stored for a session.
    ///
    /// Chunk boundaries are not stable across re-runs, so a re-run always
    /// starts from a clean slate.
    pub fn replace_chunks(&self, session_id: &str, chunks: &[ChunkRecord]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM session_chunks WHERE session_id = ?1",
            params![session_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO session_chunks (session_id, seq, file_name, media_type, chunk_index, content)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for (seq, chunk) in chunks.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    seq as i64,
                    chunk.file_name,
                    chunk.media_type,
                    chunk.chunk_index,
                    chunk.content,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get all chunks for a session in insertion order.
    pub fn get_chunks(&self, session_id: &str) -> DbResult<Vec<ChunkRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT file_name, media_type, chunk_index, content FROM session_chunks \
             WHERE session_id = ?1 ORDER BY seq",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok(ChunkRecord {
                file_name: row.get(0)?,
                media_type: row.get(1)?,
                chunk_index: row.get(2)?,
                content: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cram_core::Session;

    #[test]
    fn test_replace_and_get_chunks() {
        let db = Database::open_in_memory().unwrap();
        let session = Session::new("user-1");
        db.create_session(&session).unwrap();

        let chunks = vec![
            ChunkRecord::new("a.txt", "text/plain", 0, "first"),
            ChunkRecord::new("a.txt", "text/plain", 1, "second"),
            ChunkRecord::new("b.pdf", "application/pdf", 0, "third"),
        ];
        db.replace_chunks(&session.id, &chunks).unwrap();

        let loaded = db.get_chunks(&session.id).unwrap();
        assert_eq!(loaded, chunks);

        // Re-run replaces, not appends
        db.replace_chunks(&session.id, &chunks[..1]).unwrap();
        assert_eq!(db.get_chunks(&session.id).unwrap().len(), 1);
    }
}
