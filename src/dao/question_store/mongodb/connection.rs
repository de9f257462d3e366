use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// How hard to try before giving up on a fresh connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Pings attempted before giving up, at least one.
    pub attempts: u32,
    /// Pause after the first failed ping.
    pub initial_delay: Duration,
    /// Upper bound for the doubling pause.
    pub max_delay: Duration,
}

impl ConnectPolicy {
    /// Startup: the database container may still be booting.
    pub const STARTUP: Self = Self {
        attempts: 10,
        initial_delay: Duration::from_millis(250),
        max_delay: Duration::from_secs(5),
    };

    /// Reconnects from the storage supervisor, which already backs off between calls.
    pub const SINGLE: Self = Self {
        attempts: 1,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    };

    fn delays(self) -> impl Iterator<Item = Duration> {
        std::iter::successors(Some(self.initial_delay), move |delay| {
            Some((*delay * 2).min(self.max_delay))
        })
    }
}

pub(super) async fn ping(database: &Database) -> Result<(), mongodb::error::Error> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}

/// Build a client for `config` and wait until the catalog database answers a ping.
pub async fn connect(config: &MongoConfig, policy: ConnectPolicy) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut delays = policy.delays();
    let mut attempt = 1;
    loop {
        match ping(&database).await {
            Ok(()) => return Ok((client, database)),
            Err(source) if attempt >= policy.attempts.max(1) => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                let delay = delays.next().unwrap_or(policy.max_delay);
                debug!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "catalog ping failed; retrying");
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_delays_double_up_to_the_cap() {
        let delays: Vec<_> = ConnectPolicy::STARTUP.delays().take(7).collect();
        assert_eq!(
            delays,
            [250, 500, 1000, 2000, 4000, 5000, 5000].map(Duration::from_millis)
        );
    }
}
