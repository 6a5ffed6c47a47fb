use std::str::FromStr;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::error::AppError;

pub fn init_pool(database_url: &str, max_size: usize) -> Result<Pool, AppError> {
    let pg_config = tokio_postgres::Config::from_str(database_url)
        .map_err(|e| AppError::Config(format!("DATABASE_URL parse: {e}")))?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| AppError::StartServer(format!("db pool: {e}")))
}
