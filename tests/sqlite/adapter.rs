//! Integration tests for the rusqlite bindings against an in-memory database.

use chrono::NaiveDate;
use eql_envelope::{
    decode_sqlite_row, row_to_json, ColumnRegistry, EncryptedColumn, Envelope, PlainValue,
    QueryMode, RowValue,
};
use rusqlite::{params, Connection};
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

const TABLE: &str = "examples";

struct Columns {
    int: EncryptedColumn,
    boolean: EncryptedColumn,
    date: EncryptedColumn,
    float: EncryptedColumn,
    text: EncryptedColumn,
    jsonb: EncryptedColumn,
}

fn columns() -> Columns {
    Columns {
        int: EncryptedColumn::integer(TABLE, "encrypted_int"),
        boolean: EncryptedColumn::boolean(TABLE, "encrypted_boolean"),
        date: EncryptedColumn::date(TABLE, "encrypted_date"),
        float: EncryptedColumn::float(TABLE, "encrypted_float"),
        text: EncryptedColumn::text(TABLE, "encrypted_utf8_str"),
        jsonb: EncryptedColumn::document(TABLE, "encrypted_jsonb"),
    }
}

fn open() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory SQLite");
    conn.execute_batch(
        "CREATE TABLE examples (
            id INTEGER PRIMARY KEY,
            non_encrypted_field TEXT,
            encrypted_int TEXT,
            encrypted_boolean TEXT,
            encrypted_date TEXT,
            encrypted_float TEXT,
            encrypted_utf8_str TEXT,
            encrypted_jsonb TEXT
        );",
    )
    .expect("create table");
    conn
}

fn insert(conn: &Connection, cols: &Columns, values: [Option<PlainValue>; 6]) -> i64 {
    let [int, boolean, date, float, text, jsonb] = values;
    conn.execute(
        "INSERT INTO examples (
            non_encrypted_field, encrypted_int, encrypted_boolean, encrypted_date,
            encrypted_float, encrypted_utf8_str, encrypted_jsonb
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            "sydney",
            cols.int.to_sql(int.as_ref()).expect("bind int"),
            cols.boolean.to_sql(boolean.as_ref()).expect("bind bool"),
            cols.date.to_sql(date.as_ref()).expect("bind date"),
            cols.float.to_sql(float.as_ref()).expect("bind float"),
            cols.text.to_sql(text.as_ref()).expect("bind text"),
            cols.jsonb.to_sql(jsonb.as_ref()).expect("bind jsonb"),
        ],
    )
    .expect("insert");
    conn.last_insert_rowid()
}

fn sample() -> [Option<PlainValue>; 6] {
    [
        Some(PlainValue::Integer(1)),
        Some(PlainValue::Boolean(true)),
        Some(PlainValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
        Some(PlainValue::Float(1.1)),
        Some(PlainValue::Text("str".to_string())),
        Some(PlainValue::Document(json!({"key": "value"}))),
    ]
}

// ============================================================================
// Column hooks
// ============================================================================

#[test]
fn stored_text_is_the_canonical_envelope() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, sample());

    let stored: String = conn
        .query_row(
            "SELECT encrypted_int FROM examples WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .expect("select");
    assert_eq!(
        stored,
        r#"{"k":"pt","p":"1","i":{"t":"examples","c":"encrypted_int"},"v":1,"q":null}"#
    );
}

#[test]
fn read_decodes_each_column_kind() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, sample());

    let read = conn
        .query_row(
            "SELECT encrypted_int, encrypted_boolean, encrypted_date, encrypted_float,
                    encrypted_utf8_str, encrypted_jsonb
             FROM examples WHERE id = ?1",
            params![id],
            |row| {
                Ok([
                    cols.int.read(row, 0)?,
                    cols.boolean.read(row, 1)?,
                    cols.date.read(row, 2)?,
                    cols.float.read(row, 3)?,
                    cols.text.read(row, 4)?,
                    cols.jsonb.read(row, 5)?,
                ])
            },
        )
        .expect("select");

    assert_eq!(read, sample());
}

#[test]
fn nulls_are_stored_and_read_as_sql_null() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, [None, None, None, None, None, None]);

    let (is_null, value) = conn
        .query_row(
            "SELECT encrypted_int IS NULL, encrypted_int FROM examples WHERE id = ?1",
            params![id],
            |row| Ok((row.get::<_, bool>(0)?, cols.int.read(row, 1)?)),
        )
        .expect("select");
    assert!(is_null);
    assert_eq!(value, None);
}

#[test]
fn read_rejects_non_text_cells() {
    let conn = open();
    let cols = columns();
    let err = conn
        .query_row("SELECT 42", [], |row| cols.int.read(row, 0))
        .unwrap_err();
    assert!(matches!(err, rusqlite::Error::InvalidColumnType(0, _, _)));
}

#[test]
fn read_reports_malformed_envelopes() {
    let conn = open();
    let cols = columns();
    let err = conn
        .query_row(r#"SELECT '{"k":"pt","i":{"t":"a","c":"b"},"v":1}'"#, [], |row| {
            cols.text.read(row, 0)
        })
        .unwrap_err();
    assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(0, _, _)));
}

#[test]
fn path_query_parameter_carries_mode() {
    let cols = columns();
    let bound = cols
        .jsonb
        .bind_for_query(
            Some(&PlainValue::Document(json!("$.top.nested"))),
            Some(&QueryMode::EjsonPath),
        )
        .expect("bind")
        .expect("non-null");
    let envelope = Envelope::parse(&bound).expect("parse");
    assert_eq!(envelope.plaintext_payload(), Some("$.top.nested"));
    assert_eq!(envelope.q, Some(QueryMode::EjsonPath));
}

// ============================================================================
// Whole rows
// ============================================================================

#[test]
fn row_to_json_parses_envelope_text() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, sample());

    let row = conn
        .query_row(
            "SELECT id, non_encrypted_field, encrypted_int FROM examples WHERE id = ?1",
            params![id],
            |row| row_to_json(row),
        )
        .expect("select");

    assert_eq!(row["id"], json!(id));
    assert_eq!(row["non_encrypted_field"], json!("sydney"));
    assert_eq!(row["encrypted_int"]["p"], json!("1"));
    assert_eq!(row["encrypted_int"]["i"], json!({"t": "examples", "c": "encrypted_int"}));
}

#[test]
fn decode_sqlite_row_applies_the_registry() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, sample());
    insert(&conn, &cols, [None, None, None, None, None, None]);

    let registry = ColumnRegistry::conventional();
    let mut stmt = conn
        .prepare("SELECT * FROM examples ORDER BY id")
        .expect("prepare");
    let rows: Vec<_> = stmt
        .query_map([], |row| Ok(decode_sqlite_row(&registry, row)))
        .expect("query")
        .map(|r| r.expect("row").expect("decode"))
        .collect();

    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.get("id"), Some(&RowValue::Raw(json!(id))));
    assert_eq!(first.get("non_encrypted_field"), Some(&RowValue::Raw(json!("sydney"))));
    assert_eq!(
        first.get("encrypted_float"),
        Some(&RowValue::Decoded(PlainValue::Float(1.1)))
    );
    assert_eq!(
        first.get("encrypted_jsonb"),
        Some(&RowValue::Decoded(PlainValue::Document(json!({"key": "value"}))))
    );

    let second = &rows[1];
    assert!(second.get("encrypted_int").unwrap().is_null());
    assert!(second.get("encrypted_jsonb").unwrap().is_null());
}

#[test]
fn decode_sqlite_row_keeps_unregistered_json_text() {
    let conn = open();
    let cols = columns();
    let id = insert(&conn, &cols, sample());
    conn.execute(
        "UPDATE examples SET non_encrypted_field = ?1 WHERE id = ?2",
        params![r#"{"a":1}"#, id],
    )
    .expect("update");

    let registry = ColumnRegistry::conventional();
    let row = conn
        .query_row(
            "SELECT non_encrypted_field, encrypted_int FROM examples WHERE id = ?1",
            params![id],
            |row| Ok(decode_sqlite_row(&registry, row)),
        )
        .expect("select")
        .expect("decode");

    assert_eq!(
        row.get("non_encrypted_field"),
        Some(&RowValue::Raw(json!(r#"{"a":1}"#)))
    );
    assert_eq!(
        row.get("encrypted_int"),
        Some(&RowValue::Decoded(PlainValue::Integer(1)))
    );
}
