use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::push_pagination;
use crate::{
    db_types::{Customer, CustomerPayment, NewPaymentHistory, PaymentHistory},
    mor_api::query_objects::{CustomerFilter, Paginated, Pagination},
    traits::StorageError,
};

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, StorageError> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CustomerFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(account_id) = filter.account_id {
        where_clause.push("account_id = ");
        where_clause.push_bind_unseparated(account_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        where_clause.push("(email LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR firstname LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR lastname LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(")");
    }
}

pub async fn search_customers(
    filter: CustomerFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Paginated<Customer>, StorageError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM customers");
    push_filters(&mut count, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM customers");
    push_filters(&mut builder, &filter);
    builder.push(" ORDER BY id DESC");
    push_pagination(&mut builder, &pagination);
    trace!("🗃️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<Customer>().fetch_all(conn).await?;
    Ok(Paginated::new(items, pagination, total))
}

/// Creates the customer on its first payment, or bumps the payment counter of an existing one. Non-empty names and
/// phone numbers in `customer` overwrite the stored values.
pub async fn upsert_paying_customer(
    customer: CustomerPayment,
    conn: &mut SqliteConnection,
) -> Result<Customer, StorageError> {
    let customer: Customer = sqlx::query_as(
        r#"
            INSERT INTO customers (
                account_id,
                email,
                firstname,
                lastname,
                phone_number,
                number_of_payments,
                last_payment_made_at
            ) VALUES ($1, $2, $3, $4, $5, 1, COALESCE($6, CURRENT_TIMESTAMP))
            ON CONFLICT (account_id, email) DO UPDATE SET
                firstname = CASE WHEN excluded.firstname <> '' THEN excluded.firstname ELSE firstname END,
                lastname = CASE WHEN excluded.lastname <> '' THEN excluded.lastname ELSE lastname END,
                phone_number = CASE WHEN excluded.phone_number <> '' THEN excluded.phone_number ELSE phone_number END,
                number_of_payments = number_of_payments + 1,
                last_payment_made_at = excluded.last_payment_made_at,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(customer.account_id)
    .bind(customer.email)
    .bind(customer.firstname)
    .bind(customer.lastname)
    .bind(customer.phone_number)
    .bind(customer.paid_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Customer #{} ({}) now has {} payments", customer.id, customer.email, customer.number_of_payments);
    Ok(customer)
}

pub async fn insert_payment_history(
    customer_id: i64,
    payment: NewPaymentHistory,
    conn: &mut SqliteConnection,
) -> Result<PaymentHistory, StorageError> {
    let history = sqlx::query_as(
        r#"
            INSERT INTO payment_histories (customer_id, reference, description, amount, payment_method, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(payment.reference)
    .bind(payment.description)
    .bind(payment.amount)
    .bind(payment.payment_method)
    .bind(payment.status)
    .fetch_one(conn)
    .await?;
    Ok(history)
}

pub async fn fetch_payment_history(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentHistory>, StorageError> {
    let history = sqlx::query_as("SELECT * FROM payment_histories WHERE customer_id = $1 ORDER BY id ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(history)
}
