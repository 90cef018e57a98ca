mod common;

use common::{Script, journal_events, mock_session};
use sql_session::prelude::*;

fn one_row_script() -> Script {
    Script {
        columns: vec!["v".into()],
        rows: vec![vec![SqlValue::BigInt(1)]],
        ..Script::default()
    }
}

#[test]
fn duplicate_name_binds_every_occurrence() -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, journal) = mock_session(one_row_script(), SessionOptions::default());
    let query = Query::new("SELECT * FROM t WHERE a = :x AND b = :x").bind_named("x", 5_i64);

    session.for_each(&query, |_| Ok(()))?;

    assert_eq!(
        journal_events(&journal, "prepare"),
        vec!["prepare(plain) SELECT * FROM t WHERE a = ? AND b = ?"]
    );
    assert_eq!(
        journal_events(&journal, "bind"),
        vec!["bind 1=bigint:5", "bind 2=bigint:5"]
    );
    Ok(())
}

#[test]
fn named_values_bind_in_marker_order() -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, journal) = mock_session(one_row_script(), SessionOptions::default());
    let query = Query::with_named(
        "insert into t (a, b, c) values (:b, :a, :b)",
        named_params! { "a" => "first", "b" => 2_i32 },
    );

    session.update(&query)?;

    assert_eq!(
        journal_events(&journal, "bind"),
        vec!["bind 1=int:2", "bind 2=text:first", "bind 3=int:2"]
    );
    Ok(())
}

#[test]
fn positional_values_bind_by_index() -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, journal) = mock_session(one_row_script(), SessionOptions::default());
    let query = Query::with_params("select * from t where a = ? and b = ?", params![7_i64, true]);

    session.execute(&query)?;

    assert_eq!(
        journal_events(&journal, "bind"),
        vec!["bind 1=bigint:7", "bind 2=bool:true"]
    );
    Ok(())
}

#[test]
fn missing_name_fails_and_releases_the_statement() {
    let (mut session, journal) = mock_session(one_row_script(), SessionOptions::default());
    let query = Query::new("select :a, :b").bind_named("a", 1_i64);

    let err = session.single(&query, |_| Ok(Some(()))).unwrap_err();

    assert!(matches!(err, SqlSessionError::MissingParameter(ref name) if name == "b"));
    assert!(journal_events(&journal, "query").is_empty());
    assert_eq!(journal_events(&journal, "close statement").len(), 1);
}

#[test]
fn cursor_closes_before_statement_even_when_extractor_fails() {
    let (mut session, journal) = mock_session(one_row_script(), SessionOptions::default());
    let query = Query::new("select v from t");

    let err = session
        .list::<i64, _>(&query, |_| {
            Err(SqlSessionError::ConversionError("extractor refused".into()))
        })
        .unwrap_err();

    assert!(matches!(err, SqlSessionError::ConversionError(_)));
    let closes = journal_events(&journal, "close");
    assert_eq!(closes, vec!["close cursor", "close statement"]);
}

#[test]
fn options_shape_statement_preparation() -> Result<(), Box<dyn std::error::Error>> {
    let options = SessionOptions::builder()
        .return_generated_keys(true)
        .auto_generated_keys(["id"])
        .query_timeout_secs(30)
        .finish();
    let (conn, journal) = common::MockConnection::new(one_row_script());
    let mut oracle = Session::new(conn.named("oracle"), options.clone());
    oracle.update(&Query::new("update t set a = 1"))?;
    assert_eq!(
        journal_events(&journal, "prepare"),
        vec!["prepare(columns[id]) update t set a = 1"]
    );
    assert_eq!(journal_events(&journal, "timeout"), vec!["timeout 30"]);

    let (mut generic, journal) = mock_session(one_row_script(), options);
    generic.update(&Query::new("update t set a = 1"))?;
    assert_eq!(
        journal_events(&journal, "prepare"),
        vec!["prepare(keys) update t set a = 1"]
    );
    Ok(())
}
