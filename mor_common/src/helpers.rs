/// Prefix of the settlement wallets held by the merchant-of-record service in the wallet service.
pub const MOR_WALLET_PREFIX: &str = "MOR_";
const ESCROW_WALLET_PREFIX: &str = "ESCROW_";
/// The fallback settlement currency. It can never be removed from a merchant's wallet set.
pub const USD: &str = "USD";

/// Currency codes are compared case-insensitively, so they are always stored upper-cased and trimmed.
pub fn normalize_currency<S: AsRef<str>>(code: S) -> String {
    code.as_ref().trim().to_ascii_uppercase()
}

/// The name of the MOR settlement wallet for the given currency, e.g. `eur` -> `MOR_EUR`.
pub fn mor_wallet<S: AsRef<str>>(code: S) -> String {
    format!("{MOR_WALLET_PREFIX}{}", normalize_currency(code))
}

/// Removes any `MOR_` or `ESCROW_` wallet prefix and normalizes the remaining currency code.
pub fn strip_wallet_prefix<S: AsRef<str>>(code: S) -> String {
    let code = normalize_currency(code);
    let code = code.strip_prefix(MOR_WALLET_PREFIX).unwrap_or(&code);
    let code = code.strip_prefix(ESCROW_WALLET_PREFIX).unwrap_or(code);
    code.to_string()
}
