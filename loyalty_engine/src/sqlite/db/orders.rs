//! Sqlite database operations for the order registry.
use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{AccountId, AccrualResult, AccrualUpdate, Order, OrderNumber, OrderStatus, SubmitOutcome},
    traits::OrderRegistryError,
};

/// Claims `number` for `owner`. The unique index on `number` arbitrates concurrent claims: whoever loses the race
/// finds the winner's row and is told whether it is their own.
pub async fn idempotent_insert(
    number: &OrderNumber,
    owner: AccountId,
    conn: &mut SqliteConnection,
) -> Result<SubmitOutcome, OrderRegistryError> {
    match insert_order(number, owner, conn).await {
        Ok(order) => {
            debug!("🗃️ Order [{}] inserted with id {} for account {owner}", order.number, order.id);
            Ok(SubmitOutcome::Accepted(order))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let existing = fetch_order_by_number(number, conn).await?.ok_or_else(|| {
                OrderRegistryError::DatabaseError(format!("Order {number} vanished after a unique constraint violation"))
            })?;
            if existing.owner_id == owner {
                trace!("🗃️ Order [{number}] was already submitted by {owner}");
                Ok(SubmitOutcome::AlreadyOwnedBySelf(existing))
            } else {
                debug!("🗃️ Order [{number}] submitted by {owner} is owned by {}", existing.owner_id);
                Ok(SubmitOutcome::OwnedByOther)
            }
        },
        Err(e) => Err(e.into()),
    }
}

/// Inserts a new order with status `NEW` using the given connection. This is not atomic with respect to anything
/// else you do with the connection. Embed the call in a transaction if you need that.
async fn insert_order(number: &OrderNumber, owner: AccountId, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO orders (number, owner_id, status, accrual, submitted_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .bind(owner)
    .bind(OrderStatus::New)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the owner's orders. Resulting orders are ordered by `submitted_at` in ascending order.
pub async fn fetch_orders_for_account(owner: AccountId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE owner_id = $1 ORDER BY submitted_at ASC, id ASC")
        .bind(owner)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_pending_order_numbers(conn: &mut SqliteConnection) -> Result<Vec<OrderNumber>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT number FROM orders WHERE status IN (");
    let mut statuses = builder.separated(", ");
    for status in [OrderStatus::New, OrderStatus::Processing] {
        statuses.push_bind(status);
    }
    statuses.push_unseparated(") ORDER BY submitted_at ASC, id ASC");
    let numbers: Vec<(String,)> = builder.build_query_as().fetch_all(conn).await?;
    Ok(numbers.into_iter().map(|(n,)| OrderNumber::new_unchecked(n)).collect())
}

/// Applies an accrual result with a single conditional `UPDATE`, so a concurrent update can never move the status
/// backwards. The accrual column is only written for `PROCESSED`.
pub async fn update_accrual(
    number: &OrderNumber,
    result: AccrualResult,
    conn: &mut SqliteConnection,
) -> Result<AccrualUpdate, OrderRegistryError> {
    let predecessors = result.status.predecessors();
    if !predecessors.is_empty() {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
        builder.push_bind(result.status);
        if result.status == OrderStatus::Processed {
            builder.push(", accrual = ");
            builder.push_bind(result.accrual);
        }
        builder.push(", updated_at = ");
        builder.push_bind(Utc::now());
        builder.push(" WHERE number = ");
        builder.push_bind(number.as_str());
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for status in predecessors {
            statuses.push_bind(*status);
        }
        statuses.push_unseparated(") RETURNING *");
        let updated: Option<Order> = builder.build_query_as().fetch_optional(&mut *conn).await?;
        if let Some(order) = updated {
            debug!("🗃️ Order [{number}] is now {} with accrual {}", order.status, order.accrual);
            return Ok(AccrualUpdate::Applied(order));
        }
    }
    match fetch_order_by_number(number, conn).await? {
        Some(order) => {
            trace!("🗃️ Order [{number}] is {}. Ignoring non-forward update to {}", order.status, result.status);
            Ok(AccrualUpdate::Unchanged(order))
        },
        None => Err(OrderRegistryError::NotFound(number.to_string())),
    }
}
