use std::fmt::Display;

use chrono::{DateTime, Utc};
use mor_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

//--------------------------------------   TransactionStatus  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Successful,
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Successful => write!(f, "successful"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid transaction status: {s}")),
        }
    }
}

//--------------------------------------   VerificationStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    NotVerified,
    Pending,
    Verified,
}

//--------------------------------------     PaymentMethod     --------------------------------------------------------
/// A payment method a merchant accepts, e.g. `card`, `bank_transfer` or `mobile_money`. Always lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PaymentMethod(String);

impl PaymentMethod {
    pub fn new<S: AsRef<str>>(method: S) -> Self {
        Self(method.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        value.0
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------        Setting        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsCountry {
    pub id: i64,
    pub name: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsVerification {
    pub country_id: i64,
    pub document_url: String,
    pub status: VerificationStatus,
}

/// Per-merchant MOR configuration. There is at most one setting per account.
///
/// The list fields are stored as JSON text, so the row mapping lives with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub account_id: i64,
    pub business_type_id: i64,
    pub usage_type: String,
    pub countries: Vec<SettingsCountry>,
    pub currency_codes: Vec<String>,
    pub payment_methods: Vec<PaymentMethod>,
    pub verifications: Vec<SettingsVerification>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// True iff at least one verification record exists and every one of them is verified.
    pub fn all_verified(&self) -> bool {
        !self.verifications.is_empty() && self.verifications.iter().all(|v| v.status == VerificationStatus::Verified)
    }

    pub fn has_currency(&self, code: &str) -> bool {
        self.currency_codes.iter().any(|c| c == code)
    }
}

/// The mutable part of a [`Setting`]. Saving it creates the setting for the account if it does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveSetting {
    pub account_id: i64,
    pub business_type_id: i64,
    pub usage_type: String,
    pub countries: Vec<SettingsCountry>,
    pub currency_codes: Vec<String>,
    pub payment_methods: Vec<PaymentMethod>,
    pub verifications: Vec<SettingsVerification>,
    pub is_verified: bool,
}

impl SaveSetting {
    pub fn new(account_id: i64) -> Self {
        Self { account_id, ..Default::default() }
    }
}

impl From<Setting> for SaveSetting {
    fn from(s: Setting) -> Self {
        Self {
            account_id: s.account_id,
            business_type_id: s.business_type_id,
            usage_type: s.usage_type,
            countries: s.countries,
            currency_codes: s.currency_codes,
            payment_methods: s.payment_methods,
            verifications: s.verifications,
            is_verified: s.is_verified,
        }
    }
}

//--------------------------------------      Transaction      --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub merchant_id: i64,
    pub customer_id: Option<i64>,
    pub reference: String,
    pub description: String,
    pub amount: Money,
    pub tax_fee: Money,
    pub processing_fee: Money,
    pub country_id: i64,
    pub payment_method: String,
    pub status: TransactionStatus,
    pub is_paid_out: bool,
    pub payout_id: Option<i64>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub merchant_id: i64,
    pub customer_id: Option<i64>,
    pub reference: String,
    pub description: String,
    pub amount: Money,
    pub tax_fee: Money,
    pub processing_fee: Money,
    pub country_id: i64,
    pub payment_method: String,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(merchant_id: i64, country_id: i64, reference: String, amount: Money) -> Self {
        Self {
            merchant_id,
            customer_id: None,
            reference,
            description: String::default(),
            amount,
            tax_fee: Money::default(),
            processing_fee: Money::default(),
            country_id,
            payment_method: String::default(),
            status: TransactionStatus::Successful,
            transaction_date: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

/// Sum of unpaid transaction amounts for a single country.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub country_id: i64,
    pub amount: Money,
}

//--------------------------------------        Payout         --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub merchant_id: i64,
    pub reference: String,
    pub amount: Money,
    pub country_id: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayout {
    pub merchant_id: i64,
    pub reference: String,
    pub amount: Money,
    pub country_id: i64,
    pub status: TransactionStatus,
}

//--------------------------------------      Withdrawal       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub merchant_id: i64,
    pub currency: String,
    pub amount: Money,
    pub withdrawal_date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWithdrawal {
    pub merchant_id: i64,
    pub currency: String,
    pub amount: Money,
    pub withdrawal_date: DateTime<Utc>,
}

//--------------------------------------       Customer        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub account_id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone_number: String,
    pub country_id: Option<i64>,
    pub number_of_payments: i64,
    pub last_payment_made_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.lastname, self.firstname).trim().to_string()
    }
}

/// Details of a customer taken from a provider webhook. Customers are keyed on `(account_id, email)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPayment {
    pub account_id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone_number: String,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub id: i64,
    pub customer_id: i64,
    pub reference: String,
    pub description: String,
    pub amount: Money,
    pub payment_method: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentHistory {
    pub reference: String,
    pub description: String,
    pub amount: Money,
    pub payment_method: String,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: i64,
    pub provider: String,
    pub log: String,
    pub created_at: DateTime<Utc>,
}
