use sqlx::SqlitePool;

use crate::models::{House, HouseDetails};

pub async fn all(pool: &SqlitePool) -> Result<Vec<House>, sqlx::Error> {
    let houses = sqlx::query_as::<_, House>("SELECT * FROM House")
        .fetch_all(pool)
        .await?;
    Ok(houses)
}

pub async fn all_with_manager(pool: &SqlitePool) -> Result<Vec<HouseDetails>, sqlx::Error> {
    let houses = sqlx::query_as::<_, HouseDetails>(
        "SELECT h.id, h.manager_id, h.address, h.created_at, a.full_name AS manager_name \
         FROM House h LEFT JOIN Account a ON a.id = h.manager_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(houses)
}

pub async fn by_manager(pool: &SqlitePool, manager_id: i64) -> Result<Vec<House>, sqlx::Error> {
    let houses = sqlx::query_as::<_, House>("SELECT * FROM House WHERE manager_id = $1")
        .bind(manager_id)
        .fetch_all(pool)
        .await?;
    Ok(houses)
}

pub async fn insert(
    pool: &SqlitePool,
    manager_id: i64,
    address: &str,
) -> Result<House, sqlx::Error> {
    let created_at = chrono::Utc::now();
    let house = sqlx::query_as::<_, House>(
        "INSERT INTO House (manager_id, address, created_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(manager_id)
    .bind(address)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    log::info!("House created: id={}", house.id);
    Ok(house)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    manager_id: i64,
    address: &str,
) -> Result<House, sqlx::Error> {
    let house = sqlx::query_as::<_, House>(
        "UPDATE House SET manager_id = $1, address = $2 WHERE id = $3 RETURNING *",
    )
    .bind(manager_id)
    .bind(address)
    .bind(id)
    .fetch_one(pool)
    .await?;
    log::info!("House updated: id={}", house.id);
    Ok(house)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM House WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("House with id {} deleted", id);
    Ok(())
}
