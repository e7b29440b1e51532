//! Payload checks run before any call leaves the process. A failure here is always a `RequestFormatError`.
use mor_common::Money;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::gateway::{GatewayError, GatewayOperation, NewExchangeTransaction, WalletMutation};

static CURRENCY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]{1,15}$").expect("currency code pattern is valid"));

pub fn check_account_id(op: GatewayOperation, account_id: i64) -> Result<(), GatewayError> {
    if account_id <= 0 {
        return Err(GatewayError::format_error(op, format!("account id must be positive, got {account_id}")));
    }
    Ok(())
}

pub fn check_id(op: GatewayOperation, id: i64) -> Result<(), GatewayError> {
    if id <= 0 {
        return Err(GatewayError::format_error(op, format!("id must be positive, got {id}")));
    }
    Ok(())
}

/// Currency codes and wallet names are upper-case, e.g. `NGN` or `MOR_NGN`.
pub fn check_currency(op: GatewayOperation, code: &str) -> Result<(), GatewayError> {
    if !CURRENCY_CODE.is_match(code) {
        return Err(GatewayError::format_error(op, format!("'{code}' is not a valid currency code")));
    }
    Ok(())
}

pub fn check_amount(op: GatewayOperation, amount: Money) -> Result<(), GatewayError> {
    if !amount.is_finite() || amount.value() < 0.0 {
        return Err(GatewayError::format_error(op, format!("{amount} is not a valid amount")));
    }
    Ok(())
}

pub fn check_wallet_mutation(op: GatewayOperation, mutation: &WalletMutation) -> Result<(), GatewayError> {
    check_account_id(op, mutation.account_id)?;
    check_currency(op, &mutation.currency)?;
    check_amount(op, mutation.amount)
}

pub fn check_exchange_transaction(op: GatewayOperation, tx: &NewExchangeTransaction) -> Result<(), GatewayError> {
    check_account_id(op, tx.account_id)?;
    check_id(op, tx.rate_id)?;
    check_amount(op, tx.initial_amount)?;
    check_amount(op, tx.final_amount)
}

pub fn check_token(op: GatewayOperation, token: &str) -> Result<(), GatewayError> {
    if token.trim().is_empty() {
        return Err(GatewayError::format_error(op, "authorization token is empty"));
    }
    Ok(())
}
