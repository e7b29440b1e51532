use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use mor_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    gateway::{ExternalGateway, HttpGateway},
    traits::MorDatabase,
    CustomersApi,
    PayoutApi,
    SettingsApi,
    SqliteDatabase,
    TransactionsApi,
    WebhooksApi,
    WithdrawalApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::AuthenticationMiddlewareFactory,
    payout_worker::start_payout_worker,
    routes::{
        health,
        CompleteWithdrawalRoute,
        DocumentStatusRoute,
        ListSettingsRoute,
        ManageWalletsRoute,
        MerchantTransactionSummaryRoute,
        MyCustomerPaymentsRoute,
        MyCustomersRoute,
        MyPayoutsRoute,
        MySettingsRoute,
        MyTransactionSummaryRoute,
        MyTransactionsRoute,
        PaymentMethodsRoute,
        PayoutByIdRoute,
        PayoutToWalletsRoute,
        PayoutsRoute,
        RecordTransactionRoute,
        RequestWithdrawalRoute,
        SaveSettingsRoute,
        TransactionByIdRoute,
        TransactionSummaryRoute,
        TransactionsRoute,
        WebhookRoute,
        WithdrawalsRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

type Db = SqliteDatabase;
type Gw = HttpGateway;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = HttpGateway::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if let Some(interval) = config.payout_interval {
        let api = payout_api(&config, db.clone(), gateway.clone(), producers.clone());
        let _worker = start_payout_worker(api, interval);
    }
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The server only logs engine events. Add hooks here to notify other systems.
fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_payout_created(|ev| {
        async move {
            info!(
                "📬️ Payout [{}] of {} {} to merchant {} is {}",
                ev.payout.reference, ev.payout.amount, ev.currency, ev.payout.merchant_id, ev.payout.status
            );
        }
        .boxed()
    });
    hooks.on_withdrawal_requested(|ev| {
        async move {
            info!(
                "📬️ Merchant {} ({}) requested a withdrawal of {} {}. Withdrawal #{} is awaiting approval.",
                ev.withdrawal.merchant_id,
                ev.merchant_email,
                ev.withdrawal.amount,
                ev.withdrawal.currency,
                ev.withdrawal.id
            );
        }
        .boxed()
    });
    hooks
}

fn payout_api(config: &ServerConfig, db: Db, gateway: Gw, producers: EventProducers) -> PayoutApi<Db, Gw> {
    PayoutApi::new(db, gateway, producers)
        .with_bulk_threshold(config.bulk_payout_threshold)
        .with_enrichment_concurrency(config.enrichment_concurrency)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: Db,
    gateway: Gw,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let concurrency = config.enrichment_concurrency;
        let settings_api = SettingsApi::new(db.clone(), gateway.clone()).with_enrichment_concurrency(concurrency);
        let transactions_api =
            TransactionsApi::new(db.clone(), gateway.clone()).with_enrichment_concurrency(concurrency);
        let payout_api = payout_api(&config, db.clone(), gateway.clone(), producers.clone());
        let withdrawal_api =
            WithdrawalApi::new(db.clone(), gateway.clone(), producers.clone()).with_enrichment_concurrency(concurrency);
        let customers_api = CustomersApi::new(db.clone());
        let webhooks_api =
            WebhooksApi::new(db.clone()).with_flutterwave_secret_hash(config.flutterwave_secret_hash.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mor::access_log"))
            .app_data(web::Data::new(settings_api))
            .app_data(web::Data::new(transactions_api))
            .app_data(web::Data::new(payout_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(customers_api))
            .app_data(web::Data::new(webhooks_api))
            .configure(|cfg| configure_routes::<Db, Gw>(cfg, gateway.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Registers every route. The APIs the handlers use must already be in the app data.
pub fn configure_routes<B, G>(cfg: &mut web::ServiceConfig, gateway: G)
where
    B: MorDatabase + 'static,
    G: ExternalGateway + 'static,
{
    let admin_scope = web::scope("/admin")
        .service(RecordTransactionRoute::<B, G>::new())
        .service(TransactionByIdRoute::<B, G>::new())
        .service(TransactionSummaryRoute::<B, G>::new())
        .service(MerchantTransactionSummaryRoute::<B, G>::new())
        .service(TransactionsRoute::<B, G>::new())
        .service(ListSettingsRoute::<B, G>::new())
        .service(DocumentStatusRoute::<B, G>::new())
        .service(PayoutByIdRoute::<B, G>::new())
        .service(PayoutsRoute::<B, G>::new())
        .service(PayoutToWalletsRoute::<B, G>::new())
        .service(WithdrawalsRoute::<B, G>::new())
        .service(CompleteWithdrawalRoute::<B, G>::new());
    // Routes that require authentication
    let auth_scope = web::scope("/api")
        .wrap(AuthenticationMiddlewareFactory::new(gateway))
        .service(admin_scope)
        .service(MyCustomersRoute::<B>::new())
        .service(MyCustomerPaymentsRoute::<B>::new())
        .service(MyTransactionSummaryRoute::<B, G>::new())
        .service(MyTransactionsRoute::<B, G>::new())
        .service(MyPayoutsRoute::<B, G>::new())
        .service(RequestWithdrawalRoute::<B, G>::new())
        .service(MySettingsRoute::<B, G>::new())
        .service(SaveSettingsRoute::<B, G>::new())
        .service(PaymentMethodsRoute::<B, G>::new())
        .service(ManageWalletsRoute::<B, G>::new());
    cfg.service(health).service(WebhookRoute::<B>::new()).service(auth_scope);
}
