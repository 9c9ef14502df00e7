//! Test utilities with lazy testcontainers support
//!
//! The PostgreSQL container is started on first use and shared across tests.
//! Tests that need it are `#[ignore]`d since they require Docker.

#[cfg(test)]
pub mod containers {
    use std::sync::OnceLock;

    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres;

    static POSTGRES: OnceLock<ContainerAsync<Postgres>> = OnceLock::new();

    /// Get or start a PostgreSQL container (lazy initialization)
    pub async fn get_postgres() -> &'static ContainerAsync<Postgres> {
        if POSTGRES.get().is_none() {
            let container = Postgres::default()
                .with_user("podium")
                .with_password("podium_test")
                .with_db_name("podium_test")
                .start()
                .await
                .expect("Failed to start PostgreSQL container");

            let _ = POSTGRES.set(container);
        }
        POSTGRES.get().unwrap()
    }

    /// Get PostgreSQL connection URL from the container
    pub async fn postgres_url() -> String {
        let container = get_postgres().await;
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(5432).await.unwrap();
        format!("postgres://podium:podium_test@{}:{}/podium_test", host, port)
    }
}

#[cfg(test)]
pub mod test_db {
    use sqlx::PgPool;

    use super::containers;
    use crate::config::DatabaseConfig;
    use crate::db;

    /// Connect to the shared test database and apply migrations
    pub async fn migrated_pool() -> PgPool {
        let config = DatabaseConfig {
            url: containers::postgres_url().await,
            max_connections: 5,
            acquire_timeout_secs: 10,
        };
        let pool = db::create_pool(&config)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }
}
