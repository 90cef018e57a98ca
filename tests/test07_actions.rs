#![cfg(feature = "sqlite")]

use sql_session::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Member {
    id: i64,
    name: String,
}

fn member(row: &Row<'_>) -> Result<Option<Member>, SqlSessionError> {
    Ok(Some(Member {
        id: row.get("id")?,
        name: row.get("name")?,
    }))
}

#[test]
fn every_action_shape_runs_through_one_entry_point() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;

    let created = session.run(
        Query::new("CREATE TABLE members (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
            .as_execute(),
    )?;
    assert_eq!(created, ActionOutcome::Executed(false));

    let key = session
        .run(
            Query::new("INSERT INTO members (name) VALUES (:name)")
                .bind_named("name", "ann")
                .as_update_and_return_generated_key(),
        )?
        .into_generated_key()?;
    assert_eq!(key, Some(1));

    let inserted = session
        .run(
            Query::new("INSERT INTO members (name) VALUES (?), (?)")
                .bind("bob")
                .bind("cy")
                .as_update(),
        )?
        .into_updated()?;
    assert_eq!(inserted, 2);

    let one = session
        .run(
            Query::new("SELECT id, name FROM members WHERE name = :name")
                .bind_named("name", "bob")
                .map(member)
                .as_single(),
        )?
        .into_single()?;
    assert_eq!(
        one,
        Some(Member {
            id: 2,
            name: "bob".into()
        })
    );

    let all = session
        .run(Query::new("SELECT id, name FROM members ORDER BY id").map(member).as_list())?
        .into_list()?;
    assert_eq!(
        all.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["ann", "bob", "cy"]
    );
    Ok(())
}

#[test]
fn actions_run_inside_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;
    session.execute(&Query::new("CREATE TABLE c (n INT)"))?;

    let mut seen = Vec::new();
    session.transaction(|tx| {
        tx.run(Query::new("INSERT INTO c VALUES (1), (2), (3)").as_update())?;
        let action = Query::new("SELECT n FROM c ORDER BY n")
            .map(|row| {
                let n: i64 = row.get(0)?;
                seen.push(n);
                Ok((n > 1).then_some(n * 10))
            })
            .as_list();
        tx.run(action)?.into_list()
    })?;

    assert_eq!(seen, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn mismatched_outcome_accessor_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open_sqlite(SqliteOptions::in_memory(), SessionOptions::default())?;
    let outcome = session.run(Query::new("SELECT 1").as_execute())?;
    assert!(outcome.clone().into_executed()?);
    assert!(matches!(
        outcome.into_updated(),
        Err(SqlSessionError::ExecutionError(_))
    ));
    Ok(())
}
