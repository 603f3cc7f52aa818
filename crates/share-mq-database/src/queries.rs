//! Standalone query functions for the `share_mq` table.
//!
//! Each function takes a `&Connection` so it can run inside
//! `AsyncDatabase::call` or against a plain connection in tests.

use crate::{DatabaseError, DatabaseResult, NewShareRequest, Protocol, ShareRequest};
use rusqlite::{params, Connection, Row};

const SHARE_REQUEST_COLUMNS: &str = "id, url, data, protocol, uid, tries";

fn map_share_request(row: &Row<'_>) -> rusqlite::Result<ShareRequest> {
    Ok(ShareRequest {
        id: row.get(0)?,
        url: row.get(1)?,
        payload: row.get(2)?,
        protocol: Protocol::from_column(&row.get::<_, String>(3)?),
        owner_user_id: row.get(4)?,
        tries: row.get(5)?,
    })
}

/// Insert a new share request with `tries = 0`.
pub fn insert_share_request(
    conn: &Connection,
    request: &NewShareRequest,
) -> DatabaseResult<ShareRequest> {
    if request.url.is_empty() {
        return Err(DatabaseError::InvalidData("url must not be empty".to_string()));
    }
    if request.owner_user_id.is_empty() {
        return Err(DatabaseError::InvalidData(
            "owner_user_id must not be empty".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO share_mq (url, data, protocol, uid, tries)
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            request.url,
            request.payload,
            request.protocol.as_str(),
            request.owner_user_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_share_request(conn, id)?
        .ok_or_else(|| DatabaseError::NotFound(format!("share request {} after insert", id)))
}

/// Get a share request by ID.
pub fn get_share_request(conn: &Connection, id: i64) -> DatabaseResult<Option<ShareRequest>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM share_mq WHERE id = ?1",
        SHARE_REQUEST_COLUMNS
    ))?;

    match stmt.query_row(params![id], map_share_request) {
        Ok(request) => Ok(Some(request)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Select share requests due for delivery, fewest attempts first.
///
/// `limit == 0` returns every row. Ties on `tries` are broken by insertion
/// order (`id`), so the result is deterministic.
pub fn select_due_share_requests(
    conn: &Connection,
    limit: usize,
) -> DatabaseResult<Vec<ShareRequest>> {
    // SQLite treats a negative LIMIT as "no limit".
    let sql_limit: i64 = if limit == 0 {
        -1
    } else {
        i64::try_from(limit).unwrap_or(i64::MAX)
    };

    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM share_mq ORDER BY tries ASC, id ASC LIMIT ?1",
        SHARE_REQUEST_COLUMNS
    ))?;

    let requests = stmt
        .query_map(params![sql_limit], map_share_request)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(requests)
}

/// List every queued share request in insertion order.
pub fn list_share_requests(conn: &Connection) -> DatabaseResult<Vec<ShareRequest>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM share_mq ORDER BY id ASC",
        SHARE_REQUEST_COLUMNS
    ))?;

    let requests = stmt
        .query_map([], map_share_request)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(requests)
}

/// Set the attempt count of a share request. Returns false if it no longer exists.
pub fn update_share_request_tries(conn: &Connection, id: i64, tries: i64) -> DatabaseResult<bool> {
    let count = conn.execute(
        "UPDATE share_mq SET tries = ?1 WHERE id = ?2",
        params![tries, id],
    )?;
    Ok(count > 0)
}

/// Delete a share request. Returns false if it no longer exists.
pub fn delete_share_request(conn: &Connection, id: i64) -> DatabaseResult<bool> {
    let count = conn.execute("DELETE FROM share_mq WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Number of queued share requests.
pub fn count_share_requests(conn: &Connection) -> DatabaseResult<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM share_mq", [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}
