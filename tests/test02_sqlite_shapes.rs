#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use serde_json::json;
use sql_session::prelude::*;

fn seeded_session() -> Result<Session, SqlSessionError> {
    let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;
    session.execute(&Query::new(
        "CREATE TABLE test (
            recid INTEGER PRIMARY KEY AUTOINCREMENT,
            a INT,
            b TEXT,
            c TIMESTAMP,
            d REAL,
            e BOOLEAN,
            f BLOB,
            g JSON
        )",
    ))?;
    let insert = "INSERT INTO test (a, b, c, d, e, f, g) VALUES (:a, :b, :c, :d, :e, :f, :g)";
    let stamp = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 1))
        .ok_or_else(|| SqlSessionError::ExecutionError("bad fixture date".into()))?;
    for (a, b) in [(1_i64, "one"), (2, "two"), (3, "three")] {
        session.update(&Query::with_named(
            insert,
            named_params! {
                "a" => a,
                "b" => b,
                "c" => stamp,
                "d" => 1.5_f64 * a as f64,
                "e" => a % 2 == 1,
                "f" => vec![a as u8; 2],
                "g" => json!({"n": a}),
            },
        ))?;
    }
    Ok(session)
}

#[test]
fn single_returns_first_mapped_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let query = Query::new("SELECT a, b FROM test ORDER BY a");

    let first = session.single(&query, |row| row.get::<String, _>("b").map(Some))?;
    assert_eq!(first.as_deref(), Some("one"));

    let skipping_odd = session.single(&query, |row| {
        let a: i64 = row.get("a")?;
        Ok((a % 2 == 0).then_some(a))
    })?;
    assert_eq!(skipping_odd, Some(2));

    let none = session.single(
        &Query::new("SELECT a FROM test WHERE a > :max").bind_named("max", 10_i64),
        |row| row.get::<i64, _>(0).map(Some),
    )?;
    assert_eq!(none, None);
    Ok(())
}

#[test]
fn list_keeps_cursor_order_and_drops_none() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let query = Query::new("SELECT a, e FROM test ORDER BY a DESC");

    let odd = session.list(&query, |row| {
        let keep: bool = row.get("e")?;
        keep.then(|| row.get::<i64, _>("a")).transpose()
    })?;
    assert_eq!(odd, vec![3, 1]);
    Ok(())
}

#[test]
fn for_each_visits_every_row_with_typed_columns() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let mut seen = Vec::new();

    session.for_each(&Query::new("SELECT * FROM test ORDER BY recid"), |row| {
        let stamp: chrono::NaiveDateTime = row.get("c")?;
        let blob: Vec<u8> = row.get("f")?;
        let doc: serde_json::Value = row.get("g")?;
        seen.push((
            row.row_number(),
            row.get::<i64, _>("a")?,
            row.get::<f64, _>("d")?,
            stamp.to_string(),
            blob.len(),
            doc["n"].clone(),
        ));
        Ok(())
    })?;

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, 0);
    assert_eq!(seen[2].1, 3);
    assert!((seen[1].2 - 3.0).abs() < f64::EPSILON);
    assert_eq!(seen[0].3, "2024-01-01 08:00:01");
    assert_eq!(seen[0].4, 2);
    assert_eq!(seen[2].5, json!(3));
    Ok(())
}

#[test]
fn execute_reports_result_sets() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    assert!(session.execute(&Query::new("SELECT count(*) FROM test"))?);
    assert!(!session.execute(&Query::new("DELETE FROM test WHERE a = 1"))?);
    let remaining = session.single(&Query::new("SELECT count(*) AS n FROM test"), |row| {
        row.get::<i64, _>("n").map(Some)
    })?;
    assert_eq!(remaining, Some(2));
    Ok(())
}

#[test]
fn update_returns_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let changed = session.update(
        &Query::new("UPDATE test SET b = :b WHERE a >= :a")
            .bind_named("b", "big")
            .bind_named("a", 2_i64),
    )?;
    assert_eq!(changed, 2);
    assert_eq!(
        session.update(&Query::new("DELETE FROM test WHERE a = ?").bind(99_i64))?,
        0
    );
    Ok(())
}

#[test]
fn placeholders_inside_literals_are_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let query = Query::new("SELECT ':not_a_param' AS lit, b FROM test WHERE a = :a -- :ignored")
        .bind_named("a", 2_i64);
    let row = session.single(&query, |row| {
        Ok(Some((row.get::<String, _>("lit")?, row.get::<String, _>("b")?)))
    })?;
    assert_eq!(row, Some((":not_a_param".to_string(), "two".to_string())));
    Ok(())
}

#[test]
fn unknown_columns_surface_as_errors() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session()?;
    let err = session
        .single(&Query::new("SELECT a FROM test"), |row| {
            row.get::<i64, _>("nope").map(Some)
        })
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::ColumnNotFound(_)));
    Ok(())
}
