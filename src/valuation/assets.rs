//! Asset code normalization.
//!
//! Kraken reports fiat balances under internal 4-character codes
//! (ZUSD, ZEUR, ...). Downstream pricing and display want the plain
//! ISO codes.

/// Map a broker-internal fiat code to its common 3-character equivalent.
///
/// Codes not in the table pass through unchanged. Total and
/// case-sensitive (the broker's convention is uppercase).
pub fn normalize(code: &str) -> &str {
    match code {
        "ZUSD" => "USD",
        "ZEUR" => "EUR",
        "ZGBP" => "GBP",
        "ZCAD" => "CAD",
        "ZAUD" => "AUD",
        "ZJPY" => "JPY",
        "ZCHF" => "CHF",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fiat_codes() {
        assert_eq!(normalize("ZUSD"), "USD");
        assert_eq!(normalize("ZEUR"), "EUR");
        assert_eq!(normalize("ZGBP"), "GBP");
        assert_eq!(normalize("ZCAD"), "CAD");
        assert_eq!(normalize("ZAUD"), "AUD");
        assert_eq!(normalize("ZJPY"), "JPY");
        assert_eq!(normalize("ZCHF"), "CHF");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(normalize("USD"), "USD");
        assert_eq!(normalize("XBT"), "XBT");
        assert_eq!(normalize("DOT"), "DOT");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(normalize("zusd"), "zusd");
    }
}
