use chrono::{DateTime, Utc};
use mor_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CustomerPayment, NewPaymentHistory, TransactionStatus},
    mor_api::errors::MorApiError,
};

pub const CHARGE_COMPLETED: &str = "charge.completed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlutterwaveWebhook {
    pub event: String,
    pub data: Option<FlutterwaveCharge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlutterwaveCharge {
    pub id: Option<i64>,
    pub tx_ref: Option<String>,
    pub narration: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_type: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub customer: Option<FlutterwaveCustomer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlutterwaveCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// What a webhook tells us about a customer and their payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRecord {
    pub customer: CustomerPayment,
    pub payment: NewPaymentHistory,
}

pub fn parse_webhook(body: &str) -> Result<FlutterwaveWebhook, MorApiError> {
    serde_json::from_str(body).map_err(|e| MorApiError::validation(format!("Malformed Flutterwave webhook. {e}")))
}

/// Interprets a Flutterwave event for the merchant `account_id`. Only `charge.completed` is supported.
pub fn charge_record(account_id: i64, webhook: FlutterwaveWebhook) -> Result<ChargeRecord, MorApiError> {
    if webhook.event != CHARGE_COMPLETED {
        return Err(MorApiError::validation(format!("Flutterwave event '{}' is not supported", webhook.event)));
    }
    let data = webhook.data.unwrap_or_default();
    let customer = data.customer.unwrap_or_default();
    let email = customer.email.map(|e| e.trim().to_string()).unwrap_or_default();
    if email.is_empty() {
        return Err(MorApiError::validation("charge.completed event has no customer email"));
    }
    let (lastname, firstname) = split_name(customer.name.as_deref().unwrap_or_default());
    let paid_at = data.created_at.as_deref().map(parse_timestamp).transpose()?;
    let status = match data.status.as_deref() {
        Some("successful") => TransactionStatus::Successful,
        _ => TransactionStatus::Pending,
    };
    let amount =
        Money::try_from(data.amount.unwrap_or_default()).map_err(|e| MorApiError::validation(e.to_string()))?;
    Ok(ChargeRecord {
        customer: CustomerPayment {
            account_id,
            email,
            firstname,
            lastname,
            phone_number: customer.phone_number.unwrap_or_default(),
            paid_at,
        },
        payment: NewPaymentHistory {
            reference: data.tx_ref.unwrap_or_default(),
            description: data.narration.unwrap_or_default(),
            amount,
            payment_method: data.payment_type.unwrap_or_default(),
            status,
        },
    })
}

/// Splits a customer name into `(lastname, firstname)`. The first word is the last name.
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let lastname = parts.next().unwrap_or_default().to_string();
    let firstname = parts.next().unwrap_or_default().to_string();
    (lastname, firstname)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MorApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| MorApiError::validation(format!("Invalid created_at timestamp '{value}'. {e}")))
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    const CHARGE: &str = r#"{
        "event": "charge.completed",
        "data": {
            "id": 285959875,
            "tx_ref": "Links-616626414629",
            "narration": "Checkout",
            "amount": 100,
            "currency": "NGN",
            "payment_type": "card",
            "status": "successful",
            "created_at": "2020-07-06T19:17:04.000Z",
            "customer": { "name": "Yemi Desola", "email": "user@gmail.com", "phone_number": "08012345678" }
        }
    }"#;

    #[test]
    fn charge_completed() {
        let record = charge_record(42, parse_webhook(CHARGE).unwrap()).unwrap();
        assert_eq!(record.customer.account_id, 42);
        assert_eq!(record.customer.lastname, "Yemi");
        assert_eq!(record.customer.firstname, "Desola");
        assert_eq!(record.customer.paid_at, Some(Utc.with_ymd_and_hms(2020, 7, 6, 19, 17, 4).unwrap()));
        assert_eq!(record.payment.reference, "Links-616626414629");
        assert_eq!(record.payment.amount, Money::new(100.0));
        assert_eq!(record.payment.payment_method, "card");
        assert_eq!(record.payment.status, TransactionStatus::Successful);
    }

    #[test]
    fn unfinished_charges_are_pending() {
        let body = CHARGE.replace(r#""status": "successful""#, r#""status": "failed""#);
        let record = charge_record(42, parse_webhook(&body).unwrap()).unwrap();
        assert_eq!(record.payment.status, TransactionStatus::Pending);
    }

    #[test]
    fn unknown_events_are_rejected() {
        let body = CHARGE.replace("charge.completed", "transfer.completed");
        let err = charge_record(42, parse_webhook(&body).unwrap()).unwrap_err();
        assert!(matches!(err, MorApiError::Validation(_)));
    }

    #[test]
    fn single_names() {
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
    }
}
