use chrono::Duration;
use log::*;
use mor_engine::{gateway::ExternalGateway, traits::MorDatabase, PayoutApi};
use tokio::task::JoinHandle;

/// Starts the payout worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, every merchant with unpaid successful transactions is paid out. The first run happens straight
/// away. Must be called from within the actix system, since the engine's futures are not `Send`.
pub fn start_payout_worker<B, G>(api: PayoutApi<B, G>, interval: Duration) -> JoinHandle<()>
where
    B: MorDatabase + 'static,
    G: ExternalGateway + 'static,
{
    let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(3600));
    tokio::task::spawn_local(async move {
        let mut timer = tokio::time::interval(period);
        info!("🕰️ Payout worker started. Merchants are paid out every {} hours", interval.num_hours());
        loop {
            timer.tick().await;
            info!("🕰️ Running payout job");
            match api.payout_all_merchants().await {
                Ok(count) => info!("🕰️ Payout job complete. {count} merchants were paid out"),
                Err(e) => error!("🕰️ Error running payout job: {e}"),
            }
        }
    })
}
