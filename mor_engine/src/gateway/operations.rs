use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;

/// The closed set of calls the engine makes to sibling services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOperation {
    GetUserWithAccountId,
    GetCountryById,
    GetCountryByCurrency,
    GetRateByCurrencies,
    GetWalletBalanceByAccountIdAndCurrency,
    CreateWalletBalance,
    DebitWallet,
    CreditWallet,
    CreateExchangeTransaction,
    GetUsers,
    ValidateAuthorization,
    ToggleMorStatus,
}

impl GatewayOperation {
    pub const ALL: [GatewayOperation; 12] = [
        GatewayOperation::GetUserWithAccountId,
        GatewayOperation::GetCountryById,
        GatewayOperation::GetCountryByCurrency,
        GatewayOperation::GetRateByCurrencies,
        GatewayOperation::GetWalletBalanceByAccountIdAndCurrency,
        GatewayOperation::CreateWalletBalance,
        GatewayOperation::DebitWallet,
        GatewayOperation::CreditWallet,
        GatewayOperation::CreateExchangeTransaction,
        GatewayOperation::GetUsers,
        GatewayOperation::ValidateAuthorization,
        GatewayOperation::ToggleMorStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetUserWithAccountId => "get_user_with_account_id",
            Self::GetCountryById => "get_country_by_id",
            Self::GetCountryByCurrency => "get_country_by_currency",
            Self::GetRateByCurrencies => "get_rate_by_currencies",
            Self::GetWalletBalanceByAccountIdAndCurrency => "get_wallet_balance_by_account_id_and_currency",
            Self::CreateWalletBalance => "create_wallet_balance",
            Self::DebitWallet => "debit_wallet",
            Self::CreditWallet => "credit_wallet",
            Self::CreateExchangeTransaction => "create_exchange_transaction",
            Self::GetUsers => "get_users",
            Self::ValidateAuthorization => "validate_authorization",
            Self::ToggleMorStatus => "toggle_mor_status",
        }
    }
}

impl Display for GatewayOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayOperation {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GatewayOperation::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| GatewayError::OperationNotFound(s.to_string()))
    }
}
