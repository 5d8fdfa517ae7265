//! Store-level tests for listing, signing up, and unregistering.

use std::collections::HashSet;

use activities::error::StoreError;
use activities::repositories::ActivityRepository;
use anyhow::Result;
use sea_orm::{ConnectionTrait, Statement};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{insert_activities, new_activity, setup_file_db, setup_test_db};

#[tokio::test]
async fn empty_store_lists_nothing() -> Result<()> {
    let db = setup_test_db().await?;
    let repo = ActivityRepository::new(&db);

    assert!(repo.list_activities().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn listing_preserves_insertion_and_signup_order() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(
        &db,
        &[new_activity("Zither Club", 5), new_activity("Art Club", 5)],
    )
    .await?;

    let repo = ActivityRepository::new(&db);
    repo.signup("Art Club", "b@x.com").await?;
    repo.signup("Art Club", "a@x.com").await?;

    let listed = repo.list_activities().await?;
    let names: Vec<_> = listed.iter().map(|a| a.activity.name.as_str()).collect();
    assert_eq!(names, vec!["Zither Club", "Art Club"]);
    assert!(listed[0].participants.is_empty());
    assert_eq!(listed[1].participants, vec!["b@x.com", "a@x.com"]);
    Ok(())
}

#[tokio::test]
async fn signup_failures_are_checked_in_order() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("Duo", 2)]).await?;
    let repo = ActivityRepository::new(&db);

    assert!(matches!(
        repo.signup("Missing", "a@x.com").await,
        Err(StoreError::ActivityNotFound)
    ));

    let created = repo.signup("Duo", "a@x.com").await?;
    assert_eq!(created.email, "a@x.com");

    assert!(matches!(
        repo.signup("Duo", "a@x.com").await,
        Err(StoreError::AlreadySignedUp)
    ));

    repo.signup("Duo", "b@x.com").await?;

    // Duplicate wins over full when both apply.
    assert!(matches!(
        repo.signup("Duo", "a@x.com").await,
        Err(StoreError::AlreadySignedUp)
    ));
    assert!(matches!(
        repo.signup("Duo", "c@x.com").await,
        Err(StoreError::ActivityFull)
    ));

    let duo = repo.find_by_name("Duo").await?.expect("activity exists");
    assert_eq!(repo.participants(duo.id).await?, vec!["a@x.com", "b@x.com"]);
    Ok(())
}

#[tokio::test]
async fn activity_names_are_case_sensitive() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("Chess Club", 5)]).await?;
    let repo = ActivityRepository::new(&db);

    assert!(matches!(
        repo.signup("chess club", "a@x.com").await,
        Err(StoreError::ActivityNotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn unregister_round_trip_restores_participants() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("Chess Club", 5)]).await?;
    let repo = ActivityRepository::new(&db);
    repo.signup("Chess Club", "first@x.com").await?;

    let chess = repo.find_by_name("Chess Club").await?.expect("activity exists");
    let before = repo.participants(chess.id).await?;

    repo.signup("Chess Club", "second@x.com").await?;
    repo.unregister("Chess Club", "second@x.com").await?;

    assert_eq!(repo.participants(chess.id).await?, before);

    assert!(matches!(
        repo.unregister("Chess Club", "second@x.com").await,
        Err(StoreError::NotSignedUp)
    ));
    assert!(matches!(
        repo.unregister("Missing", "first@x.com").await,
        Err(StoreError::ActivityNotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn unregister_frees_a_seat() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("Solo", 1)]).await?;
    let repo = ActivityRepository::new(&db);

    repo.signup("Solo", "a@x.com").await?;
    assert!(matches!(
        repo.signup("Solo", "b@x.com").await,
        Err(StoreError::ActivityFull)
    ));

    repo.unregister("Solo", "a@x.com").await?;
    repo.signup("Solo", "b@x.com").await?;
    Ok(())
}

#[tokio::test]
async fn same_email_may_join_different_activities() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("One", 3), new_activity("Two", 3)]).await?;
    let repo = ActivityRepository::new(&db);

    repo.signup("One", "a@x.com").await?;
    repo.signup("Two", "a@x.com").await?;

    let listed = repo.list_activities().await?;
    assert!(listed.iter().all(|a| a.participants == vec!["a@x.com"]));
    Ok(())
}

#[tokio::test]
async fn schema_rejects_orphan_and_duplicate_rows() -> Result<()> {
    let db = setup_test_db().await?;
    insert_activities(&db, &[new_activity("Chess Club", 5)]).await?;
    let backend = db.get_database_backend();

    let orphan = db
        .execute(Statement::from_string(
            backend,
            "INSERT INTO signups (activity_id, email) VALUES (9999, 'a@x.com')".to_string(),
        ))
        .await;
    assert!(orphan.is_err(), "signup must reference an existing activity");

    let duplicate_name = db
        .execute(Statement::from_string(
            backend,
            "INSERT INTO activities (name, max_participants) VALUES ('Chess Club', 1)".to_string(),
        ))
        .await;
    assert!(duplicate_name.is_err(), "activity names must be unique");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_fill_exactly_to_capacity() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_file_db(&dir).await?;
    insert_activities(&db, &[new_activity("Tight", 3)]).await?;

    let mut handles = Vec::new();
    for i in 0..12 {
        let db = db.clone();
        // Six students, each trying twice, also races the duplicate check.
        let email = format!("student{}@x.com", i % 6);
        handles.push(tokio::spawn(async move {
            ActivityRepository::new(&db).signup("Tight", &email).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(StoreError::ActivityFull | StoreError::AlreadySignedUp) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let repo = ActivityRepository::new(&db);
    let tight = repo.find_by_name("Tight").await?.expect("activity exists");
    let participants = repo.participants(tight.id).await?;

    assert_eq!(succeeded, 3);
    assert_eq!(participants.len(), 3);
    let unique: HashSet<_> = participants.iter().collect();
    assert_eq!(unique.len(), participants.len());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_below_capacity_all_succeed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_file_db(&dir).await?;
    insert_activities(&db, &[new_activity("Big", 100)]).await?;

    let mut handles = Vec::new();
    for i in 0..20 {
        let db = db.clone();
        let email = format!("s{}@x.com", i);
        handles.push(tokio::spawn(async move {
            ActivityRepository::new(&db).signup("Big", &email).await
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await? {
            panic!("signup failed: {err:?}");
        }
    }

    let repo = ActivityRepository::new(&db);
    let big = repo.find_by_name("Big").await?.expect("activity exists");
    let participants: HashSet<_> = repo.participants(big.id).await?.into_iter().collect();
    let expected: HashSet<_> = (0..20).map(|i| format!("s{}@x.com", i)).collect();
    assert_eq!(participants, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unregisters_remove_each_signup_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db = setup_file_db(&dir).await?;
    insert_activities(&db, &[new_activity("Leaving", 10)]).await?;

    let repo = ActivityRepository::new(&db);
    for i in 0..10 {
        repo.signup("Leaving", &format!("s{}@x.com", i)).await?;
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let db = db.clone();
        let email = format!("s{}@x.com", i % 10);
        handles.push(tokio::spawn(async move {
            ActivityRepository::new(&db).unregister("Leaving", &email).await
        }));
    }

    let mut removed = 0;
    let mut not_signed_up = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => removed += 1,
            Err(StoreError::NotSignedUp) => not_signed_up += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(removed, 10);
    assert_eq!(not_signed_up, 10);
    let leaving = repo.find_by_name("Leaving").await?.expect("activity exists");
    assert!(repo.participants(leaving.id).await?.is_empty());
    Ok(())
}
