use sqlx::SqlitePool;

use crate::models::{Account, Role};

pub async fn all(pool: &SqlitePool) -> Result<Vec<Account>, sqlx::Error> {
    let accounts = sqlx::query_as::<_, Account>("SELECT * FROM Account")
        .fetch_all(pool)
        .await?;
    Ok(accounts)
}

pub async fn by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM Account WHERE phone_number = $1")
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub async fn by_role(pool: &SqlitePool, role: Role) -> Result<Vec<Account>, sqlx::Error> {
    let accounts = sqlx::query_as::<_, Account>("SELECT * FROM Account WHERE role = $1")
        .bind(role)
        .fetch_all(pool)
        .await?;
    Ok(accounts)
}

pub async fn insert(
    pool: &SqlitePool,
    full_name: &str,
    phone_number: &str,
    role: Role,
) -> Result<Account, sqlx::Error> {
    let created_at = chrono::Utc::now();
    let account = sqlx::query_as::<_, Account>(
        "INSERT INTO Account (full_name, phone_number, role, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(full_name)
    .bind(phone_number)
    .bind(role)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    log::info!("Account created: id={} role={}", account.id, account.role);
    Ok(account)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    full_name: &str,
    phone_number: &str,
    role: Role,
) -> Result<Account, sqlx::Error> {
    let account = sqlx::query_as::<_, Account>(
        "UPDATE Account SET full_name = $1, phone_number = $2, role = $3 \
         WHERE id = $4 RETURNING *",
    )
    .bind(full_name)
    .bind(phone_number)
    .bind(role)
    .bind(id)
    .fetch_one(pool)
    .await?;
    log::info!("Account updated: id={}", account.id);
    Ok(account)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM Account WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("Account with id {} deleted", id);
    Ok(())
}
