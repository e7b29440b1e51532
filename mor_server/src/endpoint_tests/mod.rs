mod access;
mod helpers;
mod mocks;
mod payouts;
mod settings;
mod transactions;
mod webhooks;
mod withdrawals;
