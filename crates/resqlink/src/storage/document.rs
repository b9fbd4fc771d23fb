//! Typed access to JSON documents.
//!
//! Every function takes a plain `&Connection`, so it works the same on the
//! shared connection and inside a [`rusqlite::Transaction`].

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A record stored in the document table.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection name, also used as the first half of the primary key.
    const COLLECTION: &'static str;

    /// The document's primary id within its collection.
    fn doc_id(&self) -> &str;

    /// Owning record, indexed for per-owner listings.
    fn owner_id(&self) -> Option<&str> {
        None
    }

    /// Secondary key that must be unique within the collection.
    fn lookup_key(&self) -> Option<String> {
        None
    }
}

fn decode<D: Document>(id: String, body: &str) -> Result<D> {
    serde_json::from_str(body).map_err(|source| Error::CorruptDocument {
        collection: D::COLLECTION,
        id,
        source,
    })
}

fn map_constraint<D: Document>(doc: &D, err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Error::conflict(format!(
                "{} {} already exists",
                D::COLLECTION,
                doc.lookup_key().unwrap_or_else(|| doc.doc_id().to_string())
            ))
        }
        other => other.into(),
    }
}

/// Insert a new document.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if the id or lookup key is already taken.
pub fn insert<D: Document>(conn: &Connection, doc: &D) -> Result<()> {
    let body = serde_json::to_string(doc)?;
    conn.execute(
        r"
        INSERT INTO documents (collection, doc_id, owner_id, lookup_key, body)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
        params![
            D::COLLECTION,
            doc.doc_id(),
            doc.owner_id(),
            doc.lookup_key(),
            body
        ],
    )
    .map_err(|err| map_constraint(doc, err))?;
    debug!("Inserted {} {}", D::COLLECTION, doc.doc_id());
    Ok(())
}

/// Overwrite an existing document.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no document has this id.
pub fn replace<D: Document>(conn: &Connection, doc: &D) -> Result<()> {
    let body = serde_json::to_string(doc)?;
    let affected = conn
        .execute(
            r"
            UPDATE documents
            SET owner_id = ?3, lookup_key = ?4, body = ?5,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE collection = ?1 AND doc_id = ?2
            ",
            params![
                D::COLLECTION,
                doc.doc_id(),
                doc.owner_id(),
                doc.lookup_key(),
                body
            ],
        )
        .map_err(|err| map_constraint(doc, err))?;
    if affected == 0 {
        return Err(Error::not_found(format!(
            "{} {} not found",
            D::COLLECTION,
            doc.doc_id()
        )));
    }
    Ok(())
}

/// Fetch a document by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored body does not decode.
pub fn get<D: Document>(conn: &Connection, id: &str) -> Result<Option<D>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![D::COLLECTION, id],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| decode(id.to_string(), &b)).transpose()
}

/// Fetch a document by its unique lookup key.
///
/// # Errors
///
/// Returns an error if the query fails or the stored body does not decode.
pub fn find_by_lookup<D: Document>(conn: &Connection, key: &str) -> Result<Option<D>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT doc_id, body FROM documents WHERE collection = ?1 AND lookup_key = ?2",
            params![D::COLLECTION, key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    row.map(|(id, body)| decode(id, &body)).transpose()
}

/// All documents owned by `owner`, in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored body does not decode.
pub fn list_by_owner<D: Document>(conn: &Connection, owner: &str) -> Result<Vec<D>> {
    let mut stmt = conn.prepare(
        r"
        SELECT doc_id, body FROM documents
        WHERE collection = ?1 AND owner_id = ?2
        ORDER BY rowid
        ",
    )?;
    let rows = stmt
        .query_map(params![D::COLLECTION, owner], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(|(id, body)| decode(id, &body)).collect()
}

/// Every document in the collection, in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored body does not decode.
pub fn list_all<D: Document>(conn: &Connection) -> Result<Vec<D>> {
    let mut stmt =
        conn.prepare("SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
    let rows = stmt
        .query_map([D::COLLECTION], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(|(id, body)| decode(id, &body)).collect()
}

/// The most recently inserted documents, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored body does not decode.
pub fn list_recent<D: Document>(conn: &Connection, limit: usize) -> Result<Vec<D>> {
    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        r"
        SELECT doc_id, body FROM documents WHERE collection = ?1
        ORDER BY rowid DESC LIMIT ?2
        ",
    )?;
    let rows = stmt
        .query_map(params![D::COLLECTION, limit_i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(|(id, body)| decode(id, &body)).collect()
}

/// Number of documents in the collection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count<D: Document>(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        [D::COLLECTION],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Bump and return the named counter, starting at 1.
///
/// Call inside the transaction that creates the record so the number is
/// never handed out twice.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn next_sequence(conn: &Connection, name: &str) -> Result<u64> {
    let value: i64 = conn.query_row(
        r"
        INSERT INTO id_sequences (name, last_value) VALUES (?1, 1)
        ON CONFLICT(name) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        ",
        [name],
        |row| row.get(0),
    )?;
    u64::try_from(value).map_err(|_| Error::internal(format!("negative sequence value for {name}")))
}
