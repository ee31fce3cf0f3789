//! Background task loops
//!
//! Four periodic jobs keep the engine healthy: the attack-window reset, the
//! persistence flush, the proxy-cache sweep and the auto-whitelist scan.
//! Each loop holds only a `Weak` reference to the engine and exits when the
//! engine is dropped. Intervals are read once at spawn time; changing them
//! requires a restart.

use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, error};
use tokio::task::JoinHandle;

use crate::guard::Guard;

/// How often expired proxy verdicts are swept out of the cache.
const PROXY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How often online sessions are scanned for auto-whitelist promotion.
const AUTO_WHITELIST_INTERVAL: Duration = Duration::from_secs(10);

/// Spawn every periodic job for the given engine. The returned handles can
/// be awaited or aborted by the host; the loops also terminate on their own
/// once the engine is dropped.
pub fn spawn_background_tasks(guard: &Arc<Guard>) -> Vec<JoinHandle<()>> {
    let config = guard.config();
    let attack_interval = Duration::from_secs(config.misc.attack_reset_interval_secs);
    let save_interval = Duration::from_secs(config.misc.auto_save_interval_secs);

    vec![
        spawn_loop(guard, attack_interval, |guard| async move {
            guard.attack().reset_tick();
        }),
        spawn_loop(guard, save_interval, |guard| async move {
            match tokio::task::spawn_blocking(move || guard.save()).await {
                Ok(Ok(())) => debug!("Periodic save completed"),
                Ok(Err(e)) => {
                    error!("Could not save data to the storage backend (save task): {e}")
                }
                Err(e) => error!("Save task failed: {e}"),
            }
        }),
        spawn_loop(guard, PROXY_SWEEP_INTERVAL, |guard| async move {
            guard.evict_proxy_cache().await;
        }),
        spawn_loop(guard, AUTO_WHITELIST_INTERVAL, |guard| async move {
            guard.auto_whitelist_tick();
        }),
    ]
}

fn spawn_loop<F, Fut>(guard: &Arc<Guard>, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn(Arc<Guard>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let weak: Weak<Guard> = Arc::downgrade(guard);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // the first tick completes immediately
        loop {
            interval.tick().await;
            match weak.upgrade() {
                Some(strong) => job(strong).await,
                None => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckMode;
    use crate::config::GuardConfig;
    use crate::error::Result;
    use crate::geo::NullGeoResolver;
    use crate::proxycheck::HttpFetcher;
    use crate::storage::backend::NullBackend;
    use async_trait::async_trait;

    struct CleanFetcher;

    #[async_trait]
    impl HttpFetcher for CleanFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok("no".to_string())
        }
    }

    #[tokio::test]
    async fn attack_reset_task_calms_the_tracker() {
        let mut config = GuardConfig::default();
        config.proxy_check.check_mode = CheckMode::Never;
        config.misc.attack_connection_threshold = 2;
        config.misc.attack_reset_interval_secs = 1;

        let guard = Guard::new(
            config,
            Arc::new(NullBackend),
            Arc::new(NullGeoResolver),
            Arc::new(CleanFetcher),
            Arc::new(|_, _| {}),
        )
        .unwrap();

        let handles = spawn_background_tasks(&guard);
        guard.attack().record_connection();
        guard.attack().record_connection();
        assert!(guard.attack().is_under_attack());

        // The first tick still observes the busy window; the second one
        // sees a calm window and deactivates attack mode.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(
            !guard.attack().is_under_attack(),
            "a calm window must deactivate attack mode"
        );

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn loops_exit_once_the_engine_is_dropped() {
        let mut config = GuardConfig::default();
        config.misc.attack_reset_interval_secs = 1;
        config.misc.auto_save_interval_secs = 1;

        let guard = Guard::new(
            config,
            Arc::new(NullBackend),
            Arc::new(NullGeoResolver),
            Arc::new(CleanFetcher),
            Arc::new(|_, _| {}),
        )
        .unwrap();

        let handles = spawn_background_tasks(&guard);
        drop(guard);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        // The reset and save loops run on a one-second period and must have
        // noticed the drop by now; the slower sweeps are just aborted.
        assert!(handles[0].is_finished());
        assert!(handles[1].is_finished());
        for handle in handles {
            handle.abort();
        }
    }
}
