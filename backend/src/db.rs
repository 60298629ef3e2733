use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{error, info};

use crate::config::Config;
use crate::models::UserProfile;
use crate::storage::{PlanStore, Storage};

pub type DbPool = Pool<Postgres>;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        name TEXT,
        age INT,
        gender TEXT,
        height INT,
        weight INT,
        target_weight INT,
        activity_level TEXT,
        pledge_days INT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#;

const CREATE_PLANS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS fitness_plans (
        id SERIAL PRIMARY KEY,
        user_id TEXT REFERENCES users(user_id),
        plan_json JSONB,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#;

// Gender and height are only written on first insert.
const UPSERT_USER: &str = r#"
    INSERT INTO users (user_id, name, age, gender, height, weight, target_weight, activity_level, pledge_days)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (user_id)
    DO UPDATE SET
        name = EXCLUDED.name,
        age = EXCLUDED.age,
        weight = EXCLUDED.weight,
        target_weight = EXCLUDED.target_weight,
        activity_level = EXCLUDED.activity_level,
        pledge_days = EXCLUDED.pledge_days"#;

const INSERT_PLAN: &str = "INSERT INTO fitness_plans (user_id, plan_json) VALUES ($1, $2::jsonb)";

/// Opens a pool without connecting; connections are made on first use.
pub fn create_pool(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Resolves the storage capability for this run from configuration.
pub async fn bootstrap(config: &Config) -> Result<Storage> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("No database URL configured, persistence disabled");
        return Ok(Storage::unconfigured());
    };

    let pool = create_pool(database_url, config.db_max_connections, config.db_acquire_timeout)?;
    Ok(Storage::connect(Arc::new(PgPlanStore::new(pool))).await)
}

#[derive(Clone)]
pub struct PgPlanStore {
    pool: DbPool,
}

impl PgPlanStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn bind_user<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    profile: &'q UserProfile,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(&profile.gender)
        .bind(profile.height)
        .bind(profile.weight)
        .bind(profile.target_weight)
        .bind(&profile.activity_level)
        .bind(profile.pledge_days)
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_schema(&self) {
        if let Err(e) = sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await {
            error!("Error creating users table: {}", e);
        }
        if let Err(e) = sqlx::query(CREATE_PLANS_TABLE).execute(&self.pool).await {
            error!("Error creating fitness_plans table: {}", e);
        }
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        bind_user(sqlx::query(UPSERT_USER), profile)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_plan(&self, user_id: &str, plan_json: &str) -> Result<()> {
        sqlx::query(INSERT_PLAN)
            .bind(user_id)
            .bind(plan_json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_plan(&self, profile: &UserProfile, plan_json: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        bind_user(sqlx::query(UPSERT_USER), profile)
            .execute(&mut *tx)
            .await?;

        sqlx::query(INSERT_PLAN)
            .bind(&profile.user_id)
            .bind(plan_json)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
