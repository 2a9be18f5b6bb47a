use std::time::Duration;

use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info};

use crate::db::PgPool;
use crate::schema::refresh_tokens;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Deletes refresh tokens whose expiry is strictly in the past. Returns
/// the number of rows removed.
pub fn delete_expired_tokens(conn: &mut PgConnection) -> Result<usize, diesel::result::Error> {
    let now = Utc::now().naive_utc();
    diesel::delete(refresh_tokens::table.filter(refresh_tokens::expires_at.lt(now)))
        .execute(conn)
}

/// Best-effort housekeeping loop: one pass immediately, then one per
/// `interval`. A failed pass is logged and retried on the next tick; it
/// never takes the serving process down with it.
pub async fn run(pool: PgPool, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "token cleanup sweep started");
    loop {
        match sweep(&pool) {
            Ok(0) => {}
            Ok(deleted) => info!(deleted, "removed expired refresh tokens"),
            Err(err) => error!(error = %err, "token cleanup pass failed"),
        }
        sleep(interval).await;
    }
}

fn sweep(pool: &PgPool) -> Result<usize, CleanupError> {
    let mut conn = pool.get()?;
    Ok(delete_expired_tokens(&mut conn)?)
}
