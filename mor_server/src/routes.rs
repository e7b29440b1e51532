//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into the engine APIs. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
//!
//! Routes under `/api` sit behind the authentication middleware and receive the caller as a `web::ReqData<Principal>`.
//! Admin routes additionally require the [`Role::Admin`] role.
use std::str::FromStr;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use mor_engine::{
    gateway::ExternalGateway,
    mor_api::{
        providers::FLUTTERWAVE_HASH_HEADER,
        query_objects::{Pagination, PayoutSearch, SettingsSearch, TransactionSearch, WithdrawalSearch},
        settings_api::{DocumentStatusUpdate, PaymentMethodAction, SaveSettingsRequest, WalletAction},
        transactions_api::RecordTransactionRequest,
        withdrawal_api::WithdrawalRequest,
    },
    traits::MorDatabase,
    CustomersApi,
    PayoutApi,
    Principal,
    Role,
    SettingsApi,
    TransactionsApi,
    WebhooksApi,
    WithdrawalApi,
};

use crate::{
    data_objects::{
        CustomerQuery,
        JsonResponse,
        PaymentMethodsRequest,
        PayoutResponse,
        PayoutToWalletRequest,
        WalletsRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($param:ident: $bound:ident),+ $(where requires [$($role:path),+])?) => {
        paste::paste! {
            pub struct [<$name:camel Route>]<$($param),+>(core::marker::PhantomData<fn() -> ($($param,)+)>);

            impl<$($param),+> [<$name:camel Route>]<$($param),+> {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self {
                    Self(core::marker::PhantomData)
                }
            }

            impl<$($param),+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$($param),+>
            where
                $($param: $bound + 'static,)+
            {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name::<$($param),+>);
                    $(let res = res.wrap($crate::middleware::AclMiddlewareFactory::new(&[$($role),+]));)?
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(webhook => Post "/webhook/{account_id}" impl B: MorDatabase);
/// Receives payment provider webhooks on behalf of the merchant in the path.
///
/// Every payload is logged. Flutterwave requests are recognised by their `verif-hash` header and, for
/// `charge.completed` events, update the merchant's customer records. The response is the updated customer, or
/// a plain acknowledgement for payloads that need no further processing.
///
/// This route is unauthenticated.
pub async fn webhook<B: MorDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: String,
    api: web::Data<WebhooksApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let account_id = path.into_inner();
    debug!("💻️ POST webhook for merchant {account_id}");
    let verif_hash = req.headers().get(FLUTTERWAVE_HASH_HEADER).and_then(|v| v.to_str().ok());
    match api.handle_webhook(account_id, verif_hash, &body).await? {
        Some(customer) => Ok(HttpResponse::Ok().json(customer)),
        None => Ok(HttpResponse::Ok().json(JsonResponse::success("Webhook received"))),
    }
}

//----------------------------------------------   Customers  ----------------------------------------------------
route!(my_customers => Get "/customers" impl B: MorDatabase);
/// The caller's customers, newest first. `search` matches email, first name or last name.
pub async fn my_customers<B: MorDatabase>(
    principal: web::ReqData<Principal>,
    query: web::Query<CustomerQuery>,
    pagination: web::Query<Pagination>,
    api: web::Data<CustomersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET customers for {}", principal.account_id);
    let customers = api.list_customers(&principal, query.into_inner().search, pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customers))
}

route!(my_customer_payments => Get "/customers/{id}/payments" impl B: MorDatabase);
pub async fn my_customer_payments<B: MorDatabase>(
    principal: web::ReqData<Principal>,
    path: web::Path<i64>,
    api: web::Data<CustomersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET payment history of customer {customer_id} for {}", principal.account_id);
    let history = api.payment_history(&principal, customer_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Transactions  ----------------------------------------------------
route!(my_transactions => Get "/transactions" impl B: MorDatabase, G: ExternalGateway);
/// The caller's transactions, newest first. Only unpaid transactions are listed unless `is_paid_out` is given.
pub async fn my_transactions<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    search: web::Query<TransactionSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transactions for {}", principal.account_id);
    let page = api.search_merchant_transactions(&principal, search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(my_transaction_summary => Get "/transactions/summary" impl B: MorDatabase, G: ExternalGateway);
/// The caller's unpaid totals, one entry per currency.
pub async fn my_transaction_summary<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transaction summary for {}", principal.account_id);
    let summary = api.transaction_summary(Some(principal.account_id)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(record_transaction => Post "/transaction" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Records a successful sale on behalf of a merchant. The transaction is picked up by the next payout.
pub async fn record_transaction<B: MorDatabase, G: ExternalGateway>(
    body: web::Json<RecordTransactionRequest>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST transaction [{}] for merchant {}", req.reference, req.account_id);
    let transaction = api.record_transaction(req).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

route!(transaction_by_id => Get "/transaction/{id}" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
pub async fn transaction_by_id<B: MorDatabase, G: ExternalGateway>(
    path: web::Path<i64>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET transaction {id}");
    let transaction = api.get_transaction(id).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

route!(transactions => Get "/transactions" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Transactions across all merchants, newest first.
pub async fn transactions<B: MorDatabase, G: ExternalGateway>(
    search: web::Query<TransactionSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transactions");
    let page = api.search_transactions(search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(transaction_summary => Get "/transactions/summary" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
pub async fn transaction_summary<B: MorDatabase, G: ExternalGateway>(
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transaction summary");
    let summary = api.transaction_summary(None).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(merchant_transaction_summary => Get "/transactions/summary/{account_id}" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
pub async fn merchant_transaction_summary<B: MorDatabase, G: ExternalGateway>(
    path: web::Path<i64>,
    api: web::Data<TransactionsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let account_id = path.into_inner();
    debug!("💻️ GET transaction summary for {account_id}");
    let summary = api.transaction_summary(Some(account_id)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Payouts  ----------------------------------------------------
route!(my_payouts => Get "/payouts" impl B: MorDatabase, G: ExternalGateway);
pub async fn my_payouts<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    search: web::Query<PayoutSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payouts for {}", principal.account_id);
    let page = api.search_merchant_payouts(&principal, search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(payout_by_id => Get "/payout/{id}" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
pub async fn payout_by_id<B: MorDatabase, G: ExternalGateway>(
    path: web::Path<i64>,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET payout {id}");
    let payout = api.get_payout(id).await?;
    Ok(HttpResponse::Ok().json(payout))
}

route!(payouts => Get "/payouts" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// All payouts, newest first. `merchant_id` narrows the list to a single merchant.
pub async fn payouts<B: MorDatabase, G: ExternalGateway>(
    search: web::Query<PayoutSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payouts");
    let page = api.search_payouts(search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(payout_to_wallets => Post "/payout/to-wallet" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Pays out the listed merchants' unpaid transactions into their `MOR_` wallets.
///
/// Short lists are paid out before the response is sent, and the first failing merchant fails the request. Long lists
/// are paid out in the background and the response only says that the payout started.
pub async fn payout_to_wallets<B: MorDatabase + 'static, G: ExternalGateway + 'static>(
    body: web::Json<PayoutToWalletRequest>,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let account_ids = body.into_inner().account_ids;
    debug!("💻️ POST payout to wallets for {} merchants", account_ids.len());
    let outcome = api.payout_to_wallets(account_ids).await?;
    Ok(HttpResponse::Ok().json(PayoutResponse::from(outcome)))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
route!(request_withdrawal => Post "/withdrawal/request" impl B: MorDatabase, G: ExternalGateway);
/// Requests a withdrawal from the caller's `MOR_` wallet. The wallet must cover the amount plus every withdrawal that
/// is still pending in that currency.
pub async fn request_withdrawal<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<WithdrawalApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST withdrawal request of {} {} for {}", req.amount, req.currency, principal.account_id);
    let withdrawal = api.request_withdrawal(&principal, req).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

route!(withdrawals => Get "/withdrawals" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Withdrawals, oldest withdrawal date first. Only pending withdrawals are listed unless `status` is given.
pub async fn withdrawals<B: MorDatabase, G: ExternalGateway>(
    search: web::Query<WithdrawalSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<WithdrawalApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals");
    let page = api.search_withdrawals(search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(complete_withdrawal => Patch "/withdrawal/complete/{id}" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
pub async fn complete_withdrawal<B: MorDatabase, G: ExternalGateway>(
    path: web::Path<i64>,
    api: web::Data<WithdrawalApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH complete withdrawal {id}");
    let withdrawal = api.complete_withdrawal(id).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(my_settings => Get "/settings" impl B: MorDatabase, G: ExternalGateway);
/// The caller's settings, or `null` if they have never saved any.
pub async fn my_settings<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET settings for {}", principal.account_id);
    let setting = api.get_settings(&principal).await?;
    Ok(HttpResponse::Ok().json(setting))
}

route!(save_settings => Post "/settings" impl B: MorDatabase, G: ExternalGateway);
pub async fn save_settings<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    body: web::Json<SaveSettingsRequest>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST settings for {}", principal.account_id);
    let setting = api.save_settings(&principal, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(setting))
}

route!(payment_methods => Post "/settings/payment-methods/{action}" impl B: MorDatabase, G: ExternalGateway);
/// `action` is `enable` or `disable`.
pub async fn payment_methods<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
    body: web::Json<PaymentMethodsRequest>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let action = PaymentMethodAction::from_str(&path.into_inner())?;
    debug!("💻️ POST payment methods ({action:?}) for {}", principal.account_id);
    let setting = api.set_payment_methods(&principal, action, body.into_inner().methods).await?;
    Ok(HttpResponse::Ok().json(setting))
}

route!(manage_wallets => Post "/settings/wallets/{action}" impl B: MorDatabase, G: ExternalGateway);
/// `action` is `add`, `delete` or `get`. The response maps each `MOR_` wallet name to its balance.
pub async fn manage_wallets<B: MorDatabase, G: ExternalGateway>(
    principal: web::ReqData<Principal>,
    path: web::Path<String>,
    body: web::Json<WalletsRequest>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let action = WalletAction::from_str(&path.into_inner())?;
    debug!("💻️ POST wallets ({action:?}) for {}", principal.account_id);
    let wallets = api.manage_wallets(&principal, action, body.into_inner().currency_codes).await?;
    Ok(HttpResponse::Ok().json(wallets))
}

route!(list_settings => Get "/settings" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Merchant settings, newest first. `search` is matched against verified merchants' names and emails.
pub async fn list_settings<B: MorDatabase, G: ExternalGateway>(
    search: web::Query<SettingsSearch>,
    pagination: web::Query<Pagination>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET settings list");
    let page = api.list_settings(search.into_inner(), pagination.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(document_status => Post "/settings/{id}/document" impl B: MorDatabase, G: ExternalGateway where requires [Role::Admin]);
/// Sets the verification status of one country's document. Once every document is verified the merchant's MOR
/// account is enabled.
pub async fn document_status<B: MorDatabase, G: ExternalGateway>(
    path: web::Path<i64>,
    body: web::Json<DocumentStatusUpdate>,
    api: web::Data<SettingsApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let update = body.into_inner();
    debug!("💻️ POST document status for setting {id}, country {}", update.country_id);
    let setting = api.update_document_status(id, update).await?;
    Ok(HttpResponse::Ok().json(setting))
}
