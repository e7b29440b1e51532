use mor_common::{mor_wallet, Money};
use serde::{Deserialize, Serialize};

/// A user as known to the identity service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub account_id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub account_type: String,
}

impl User {
    /// Display name, family name first.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.lastname, self.firstname).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub currency_code: String,
}

/// A conversion rate between two currencies, `amount / initial_amount`. An `id` of zero or less means the wallet
/// service has no rate for the pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRate {
    pub id: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub amount: f64,
    pub initial_amount: f64,
}

impl ExchangeRate {
    pub fn is_valid(&self) -> bool {
        self.id > 0
    }

    /// `amount / initial_amount`, or zero when `initial_amount` is zero.
    pub fn multiplier(&self) -> f64 {
        if self.initial_amount > 0.0 {
            self.amount / self.initial_amount
        } else {
            0.0
        }
    }

    pub fn convert(&self, value: Money) -> Money {
        value * self.multiplier()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletBalance {
    pub account_id: i64,
    pub currency: String,
    pub available: Money,
}

/// A credit or debit against one of a merchant's wallets.
///
/// `currency` is sent as-is. When `is_mor` is set, the wallet service applies the settlement wallet prefix itself,
/// so the affected wallet is the one named by [`WalletMutation::wallet_name`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletMutation {
    pub account_id: i64,
    pub currency: String,
    pub amount: Money,
    pub is_refund: bool,
    pub is_mor: bool,
    pub escrow_wallet: bool,
}

impl WalletMutation {
    pub fn new<S: Into<String>>(account_id: i64, currency: S, amount: Money) -> Self {
        Self { account_id, currency: currency.into(), amount, ..Default::default() }
    }

    /// A mutation of the MOR settlement wallet for the raw currency code.
    pub fn mor<S: Into<String>>(account_id: i64, currency: S, amount: Money) -> Self {
        Self { is_mor: true, ..Self::new(account_id, currency, amount) }
    }

    pub fn wallet_name(&self) -> String {
        if self.is_mor {
            mor_wallet(&self.currency)
        } else {
            self.currency.clone()
        }
    }
}

/// Audit record of a currency conversion between two of a merchant's wallets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExchangeTransaction {
    pub account_id: i64,
    pub rate_id: i64,
    pub initial_amount: Money,
    pub final_amount: Money,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    /// Only return users whose MOR account is enabled.
    pub verified_only: bool,
    pub search: Option<String>,
}

impl UserFilter {
    pub fn verified_matching<S: Into<String>>(search: S) -> Self {
        Self { verified_only: true, search: Some(search.into()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorStatusUpdate {
    pub account_id: i64,
    pub enabled: bool,
}
