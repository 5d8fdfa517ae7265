//! # Activity Repository
//!
//! Catalog and signup store. Every operation runs in its own short-lived
//! transaction; dropping the transaction on an early return rolls it back.
//!
//! The signup path enforces both write invariants in the database:
//! the `(activity_id, email)` unique index rejects duplicates, and the row is
//! written by a single guarded `INSERT ... SELECT ... WHERE count < max`
//! statement, so concurrent signups cannot push an activity past capacity.
//!
//! Signup and unregister open with their write and classify a zero-row
//! outcome with follow-up reads. SQLite then queues concurrent writers on its
//! busy timeout instead of failing them with `SQLITE_BUSY`.

use std::collections::HashMap;

use chrono::Utc;
use metrics::counter;
use sea_orm::sea_query::{Expr, Query, SimpleExpr, SubQueryStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::error::{StoreError, is_unique_violation};
use crate::models::activity::{self, Entity as Activity};
use crate::models::signup::{self, Entity as Signup};

/// Data for inserting a new activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub max_participants: i32,
}

/// An activity together with its current participant emails, in signup order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWithParticipants {
    pub activity: activity::Model,
    pub participants: Vec<String>,
}

/// Repository for activity and signup database operations
pub struct ActivityRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new ActivityRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List all activities in insertion order, each with its participants.
    pub async fn list_activities(&self) -> Result<Vec<ActivityWithParticipants>, StoreError> {
        let txn = self.db.begin().await?;

        let activities = Activity::find()
            .order_by_asc(activity::Column::Id)
            .all(&txn)
            .await?;

        let signups = Signup::find()
            .order_by_asc(signup::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        let mut participants_by_activity: HashMap<i32, Vec<String>> = HashMap::new();
        for signup in signups {
            participants_by_activity
                .entry(signup.activity_id)
                .or_default()
                .push(signup.email);
        }

        Ok(activities
            .into_iter()
            .map(|activity| ActivityWithParticipants {
                participants: participants_by_activity
                    .remove(&activity.id)
                    .unwrap_or_default(),
                activity,
            })
            .collect())
    }

    /// Find an activity by its unique name.
    ///
    /// Lookup helper for fixtures and tests; request handlers go through
    /// [`Self::signup`] and [`Self::unregister`].
    pub async fn find_by_name(&self, name: &str) -> Result<Option<activity::Model>, StoreError> {
        Ok(find_activity(self.db, name).await?)
    }

    /// Number of activities currently in the catalog (fixture/test helper)
    pub async fn count_activities(&self) -> Result<u64, StoreError> {
        Ok(Activity::find().count(self.db).await?)
    }

    /// Participant emails of one activity, in signup order (fixture/test helper)
    pub async fn participants(&self, activity_id: i32) -> Result<Vec<String>, StoreError> {
        let emails = Signup::find()
            .select_only()
            .column(signup::Column::Email)
            .filter(signup::Column::ActivityId.eq(activity_id))
            .order_by_asc(signup::Column::Id)
            .into_tuple::<String>()
            .all(self.db)
            .await?;
        Ok(emails)
    }

    /// Insert a batch of activities in one transaction; returns how many were written.
    ///
    /// Fixture helper; startup seeding shares [`insert_activities`] instead.
    pub async fn create_many(&self, activities: &[NewActivity]) -> Result<usize, StoreError> {
        let txn = self.db.begin().await?;
        let inserted = insert_activities(&txn, activities).await?;
        txn.commit().await?;
        Ok(inserted)
    }

    /// Register `email` for the named activity.
    ///
    /// Checks run in order: unknown activity, duplicate signup, capacity.
    #[instrument(skip(self))]
    pub async fn signup(&self, activity_name: &str, email: &str) -> Result<signup::Model, StoreError> {
        let result = self.try_signup(activity_name, email).await;
        match &result {
            Ok(_) => counter!("activity_signups_total").increment(1),
            Err(err) => {
                counter!("activity_signups_rejected_total", "reason" => err.reason()).increment(1)
            }
        }
        result
    }

    async fn try_signup(
        &self,
        activity_name: &str,
        email: &str,
    ) -> Result<signup::Model, StoreError> {
        let txn = self.db.begin().await?;

        // On SQLite the guarded insert must be the first statement so the
        // transaction starts as a writer; a prior read cannot be upgraded
        // while another writer is active.
        if txn.get_database_backend() != DbBackend::Sqlite {
            Activity::find()
                .filter(activity::Column::Name.eq(activity_name))
                .lock_exclusive()
                .one(&txn)
                .await?;
        }

        let inserted = match insert_signup_within_capacity(&txn, activity_name, email).await {
            Ok(rows) => rows,
            // The row exists only if the activity does, so not-found cannot apply.
            Err(err) if is_unique_violation(&err) => return Err(StoreError::AlreadySignedUp),
            Err(err) => return Err(err.into()),
        };

        let activity = find_activity(&txn, activity_name)
            .await?
            .ok_or(StoreError::ActivityNotFound)?;
        let existing = find_signup(&txn, activity.id, email).await?;

        let created = match (inserted, existing) {
            (0, Some(_)) => return Err(StoreError::AlreadySignedUp),
            (0, None) => {
                debug!(activity_id = activity.id, "Activity at capacity");
                return Err(StoreError::ActivityFull);
            }
            (_, Some(created)) => created,
            (_, None) => {
                return Err(DbErr::RecordNotFound(format!("signup for {}", email)).into());
            }
        };

        txn.commit().await?;

        info!(activity_id = activity.id, signup_id = created.id, "Signup created");
        Ok(created)
    }

    /// Remove the signup of `email` from the named activity.
    #[instrument(skip(self))]
    pub async fn unregister(&self, activity_name: &str, email: &str) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let activity_ids = Query::select()
            .column(activity::Column::Id)
            .from(Activity)
            .and_where(Expr::col(activity::Column::Name).eq(activity_name))
            .to_owned();

        let deleted = Signup::delete_many()
            .filter(signup::Column::ActivityId.in_subquery(activity_ids))
            .filter(signup::Column::Email.eq(email))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            return match find_activity(&txn, activity_name).await? {
                Some(_) => Err(StoreError::NotSignedUp),
                None => Err(StoreError::ActivityNotFound),
            };
        }

        txn.commit().await?;

        counter!("activity_unregistrations_total").increment(1);
        info!("Signup removed");
        Ok(())
    }
}

/// Insert activities through an open transaction (shared with seeding).
pub(crate) async fn insert_activities(
    txn: &DatabaseTransaction,
    activities: &[NewActivity],
) -> Result<usize, DbErr> {
    for new_activity in activities {
        activity::ActiveModel {
            name: Set(new_activity.name.clone()),
            description: Set(new_activity.description.clone()),
            schedule: Set(new_activity.schedule.clone()),
            max_participants: Set(new_activity.max_participants),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(activities.len())
}

async fn find_activity<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<activity::Model>, DbErr> {
    Activity::find()
        .filter(activity::Column::Name.eq(name))
        .one(conn)
        .await
}

async fn find_signup(
    txn: &DatabaseTransaction,
    activity_id: i32,
    email: &str,
) -> Result<Option<signup::Model>, DbErr> {
    Signup::find()
        .filter(signup::Column::ActivityId.eq(activity_id))
        .filter(signup::Column::Email.eq(email))
        .one(txn)
        .await
}

/// ```sql
/// INSERT INTO signups (activity_id, email, created_at)
/// SELECT activities.id, ?, ? FROM activities
/// WHERE activities.name = ?
///   AND (SELECT COUNT(signups.id) FROM signups
///        WHERE signups.activity_id = activities.id) < activities.max_participants
/// ```
///
/// Returns the affected row count: 0 when the activity is missing or full.
async fn insert_signup_within_capacity(
    txn: &DatabaseTransaction,
    activity_name: &str,
    email: &str,
) -> Result<u64, DbErr> {
    let current_count = Query::select()
        .expr(Expr::col((Signup, signup::Column::Id)).count())
        .from(Signup)
        .and_where(
            Expr::col((Signup, signup::Column::ActivityId))
                .equals((Activity, activity::Column::Id)),
        )
        .to_owned();

    let guarded_row = Query::select()
        .column((Activity, activity::Column::Id))
        .exprs([
            Expr::val(email.to_string()),
            Expr::val(Utc::now().fixed_offset()),
        ])
        .from(Activity)
        .and_where(Expr::col((Activity, activity::Column::Name)).eq(activity_name))
        .and_where(
            Expr::expr(SimpleExpr::SubQuery(
                None,
                Box::new(SubQueryStatement::SelectStatement(current_count)),
            ))
            .lt(Expr::col((Activity, activity::Column::MaxParticipants))),
        )
        .to_owned();

    let insert = Query::insert()
        .into_table(Signup)
        .columns([
            signup::Column::ActivityId,
            signup::Column::Email,
            signup::Column::CreatedAt,
        ])
        .select_from(guarded_row)
        .map_err(|err| DbErr::Custom(err.to_string()))?
        .to_owned();

    let backend = txn.get_database_backend();
    let result = txn.execute(backend.build(&insert)).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn activity(name: &str, max_participants: i32) -> NewActivity {
        NewActivity {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            schedule: Some("Fridays, 3:30 PM - 5:00 PM".to_string()),
            max_participants,
        }
    }

    #[tokio::test]
    async fn guarded_insert_writes_nothing_when_full() {
        let db = setup_db().await;
        let repo = ActivityRepository::new(&db);
        repo.create_many(&[activity("Solo", 1)]).await.unwrap();

        let txn = db.begin().await.unwrap();
        assert_eq!(
            insert_signup_within_capacity(&txn, "Solo", "a@x.com").await.unwrap(),
            1
        );
        assert_eq!(
            insert_signup_within_capacity(&txn, "Solo", "b@x.com").await.unwrap(),
            0
        );
        txn.commit().await.unwrap();

        let solo = repo.find_by_name("Solo").await.unwrap().unwrap();
        assert_eq!(repo.participants(solo.id).await.unwrap(), vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn guarded_insert_writes_nothing_for_unknown_activity() {
        let db = setup_db().await;

        let txn = db.begin().await.unwrap();
        assert_eq!(
            insert_signup_within_capacity(&txn, "Foo", "a@x.com").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn guarded_insert_reports_duplicates_as_unique_violation() {
        let db = setup_db().await;
        let repo = ActivityRepository::new(&db);
        repo.create_many(&[activity("Pair", 5)]).await.unwrap();

        let txn = db.begin().await.unwrap();
        insert_signup_within_capacity(&txn, "Pair", "a@x.com")
            .await
            .unwrap();
        let err = insert_signup_within_capacity(&txn, "Pair", "a@x.com")
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn duplicate_is_reported_before_full() {
        let db = setup_db().await;
        let repo = ActivityRepository::new(&db);
        repo.create_many(&[activity("Solo", 1)]).await.unwrap();
        repo.signup("Solo", "a@x.com").await.unwrap();

        assert!(matches!(
            repo.signup("Solo", "a@x.com").await,
            Err(StoreError::AlreadySignedUp)
        ));
        assert!(matches!(
            repo.signup("Solo", "b@x.com").await,
            Err(StoreError::ActivityFull)
        ));
    }

    #[tokio::test]
    async fn zero_capacity_activity_is_always_full() {
        let db = setup_db().await;
        let repo = ActivityRepository::new(&db);
        repo.create_many(&[activity("Closed", 0)]).await.unwrap();

        let err = repo.signup("Closed", "a@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::ActivityFull));
    }

    #[tokio::test]
    async fn failed_signup_leaves_no_open_transaction() {
        let db = setup_db().await;
        let repo = ActivityRepository::new(&db);
        repo.create_many(&[activity("Chess Club", 2)]).await.unwrap();

        for _ in 0..3 {
            assert!(matches!(
                repo.signup("Foo", "a@x.com").await,
                Err(StoreError::ActivityNotFound)
            ));
        }

        // Pool of one connection: would hang if a transaction leaked.
        repo.signup("Chess Club", "a@x.com").await.unwrap();
        assert_eq!(repo.count_activities().await.unwrap(), 1);
    }
}
