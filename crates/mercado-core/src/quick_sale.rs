//! # Quick-Sale Parser
//!
//! Free-text shortcut for registering a sale without a structured form:
//! `"Leite - 2 pix"` sells two units of the first product whose name
//! contains "leite", paid via PIX.
//!
//! ## Parse Pipeline
//! ```text
//! "Leite - 2 pix"
//!      │  strip payment keyword ("pix")
//!      ▼
//! "Leite - 2"
//!      │  split on first hyphen, right side parses as integer
//!      ▼
//! { name_query: "leite", quantity: 2, payment_method: Pix }
//! ```
//!
//! This is a heuristic, not a grammar. Digits inside product names and
//! payment words inside product names can mislead it; the parser stays
//! pure and isolated so that ambiguity never leaks into the sale
//! transaction contract.

use thiserror::Error;

use crate::types::{PaymentMethod, Product};

// =============================================================================
// Errors
// =============================================================================

/// Typed parse/resolution failures for quick-sale input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuickSaleError {
    /// Input was empty or whitespace.
    #[error("input is empty")]
    EmptyInput,

    /// Nothing left to use as a product name after stripping quantity and
    /// payment method.
    #[error("no product name in input")]
    MissingName,

    /// No product name contains the parsed query.
    #[error("no product matching '{0}'")]
    ProductNotFound(String),
}

// =============================================================================
// Parsed Result
// =============================================================================

/// Structured result of parsing a quick-sale line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickSale {
    /// Lowercased, whitespace-normalized product name query.
    pub name_query: String,
    /// Units to sell. Defaults to 1 when no number is found.
    pub quantity: i64,
    /// Defaults to [`PaymentMethod::Dinheiro`] when no keyword is found.
    pub payment_method: PaymentMethod,
}

/// Payment keywords, checked in order; first keyword found in the input
/// wins. Accented spellings map to the same method.
const PAYMENT_KEYWORDS: &[(&str, PaymentMethod)] = &[
    ("pix", PaymentMethod::Pix),
    ("credito", PaymentMethod::Credito),
    ("crédito", PaymentMethod::Credito),
    ("debito", PaymentMethod::Debito),
    ("débito", PaymentMethod::Debito),
    ("dinheiro", PaymentMethod::Dinheiro),
];

// =============================================================================
// Parsing
// =============================================================================

/// Parses a free-text quick-sale line into name query, quantity, and
/// payment method.
///
/// ## Rules
/// - Payment: case-insensitive substring match against the fixed keyword
///   set; the matched keyword is removed before further parsing.
/// - Quantity: if the remaining text has a hyphen and the segment after the
///   first hyphen parses as a positive integer, that is the quantity and
///   the left segment the name. Otherwise the hyphen belongs to the name
///   and the text is scanned for standalone integer tokens (last one wins,
///   only that token is stripped). No number at all means quantity 1.
///
/// ## Example
/// ```rust
/// use mercado_core::quick_sale::parse;
/// use mercado_core::types::PaymentMethod;
///
/// let q = parse("Leite - 2 pix").unwrap();
/// assert_eq!(q.name_query, "leite");
/// assert_eq!(q.quantity, 2);
/// assert_eq!(q.payment_method, PaymentMethod::Pix);
/// ```
pub fn parse(input: &str) -> Result<QuickSale, QuickSaleError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QuickSaleError::EmptyInput);
    }

    // Payment method: first keyword found wins, then gets stripped.
    let mut payment_method = PaymentMethod::default();
    let mut rest = trimmed.to_string();
    for (keyword, method) in PAYMENT_KEYWORDS {
        if let Some((start, end)) = find_case_insensitive(&rest, keyword) {
            payment_method = *method;
            rest.replace_range(start..end, " ");
            break;
        }
    }

    // Quantity: hyphen form first, token scan as fallback.
    let mut quantity: Option<i64> = None;
    let mut name_part = rest.clone();

    if let Some(pos) = rest.find('-') {
        let right = rest[pos + 1..].trim();
        if let Ok(qty) = right.parse::<i64>() {
            if qty > 0 {
                quantity = Some(qty);
                name_part = rest[..pos].to_string();
            }
        }
    }

    if quantity.is_none() {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let mut found: Option<(usize, i64)> = None;
        for (idx, token) in tokens.iter().enumerate() {
            if let Ok(qty) = token.parse::<i64>() {
                if qty > 0 {
                    // Last standalone number wins.
                    found = Some((idx, qty));
                }
            }
        }
        if let Some((idx, qty)) = found {
            quantity = Some(qty);
            name_part = tokens
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, t)| *t)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    let name_query = normalize(&name_part);
    if name_query.is_empty() {
        return Err(QuickSaleError::MissingName);
    }

    Ok(QuickSale {
        name_query,
        quantity: quantity.unwrap_or(1),
        payment_method,
    })
}

/// Resolves a parsed name query against the catalog: first product whose
/// name contains the query, case-insensitively.
///
/// Callers pass products in a deterministic order (name order) so "first
/// match" is stable.
pub fn resolve_product<'a>(products: &'a [Product], name_query: &str) -> Option<&'a Product> {
    products
        .iter()
        .find(|p| p.name.to_lowercase().contains(name_query))
}

/// Lowercases and collapses runs of whitespace to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Finds `needle` in `haystack` ignoring case, returning the byte range of
/// the match in `haystack`.
///
/// Works on char boundaries so accented keywords (`crédito`) match their
/// uppercase forms without byte-offset drift.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut end = start;
        let mut matched = 0;
        for c in haystack[start..].chars() {
            if matched == needle_chars.len() {
                break;
            }
            if !c.to_lowercase().eq(needle_chars[matched].to_lowercase()) {
                break;
            }
            end += c.len_utf8();
            matched += 1;
        }
        if matched == needle_chars.len() {
            return Some((start, end));
        }
    }

    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::types::DEFAULT_USER_ID;

    fn product(name: &str) -> Product {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        Product {
            id: format!("prod-{}", name.to_lowercase().replace(' ', "-")),
            user_id: DEFAULT_USER_ID.to_string(),
            name: name.to_string(),
            category: "outros".to_string(),
            cost_price_cents: 200,
            sale_price_cents: 500,
            supplier_id: None,
            stock_quantity: 10,
            min_stock: 2,
            entry_date: now.date_naive(),
            expiry_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_hyphen_quantity_and_payment() {
        let q = parse("Leite - 2 pix").unwrap();
        assert_eq!(q.name_query, "leite");
        assert_eq!(q.quantity, 2);
        assert_eq!(q.payment_method, PaymentMethod::Pix);
    }

    #[test]
    fn test_defaults_when_only_name() {
        let q = parse("Pão Francês").unwrap();
        assert_eq!(q.name_query, "pão francês");
        assert_eq!(q.quantity, 1);
        assert_eq!(q.payment_method, PaymentMethod::Dinheiro);
    }

    #[test]
    fn test_hyphen_without_number_falls_back_to_token_scan() {
        // Hyphen stays in the name; "3" is a standalone token.
        let q = parse("Coca - Cola 3 debito").unwrap();
        assert_eq!(q.name_query, "coca - cola");
        assert_eq!(q.quantity, 3);
        assert_eq!(q.payment_method, PaymentMethod::Debito);
    }

    #[test]
    fn test_accented_payment_keyword() {
        let q = parse("Arroz 5kg - 3 Débito").unwrap();
        assert_eq!(q.name_query, "arroz 5kg");
        assert_eq!(q.quantity, 3);
        assert_eq!(q.payment_method, PaymentMethod::Debito);
    }

    #[test]
    fn test_last_standalone_number_wins() {
        let q = parse("Skol 269ml 12").unwrap();
        // "269ml" is not standalone; "12" is.
        assert_eq!(q.name_query, "skol 269ml");
        assert_eq!(q.quantity, 12);
    }

    #[test]
    fn test_tight_hyphen() {
        let q = parse("Leite-2").unwrap();
        assert_eq!(q.name_query, "leite");
        assert_eq!(q.quantity, 2);
    }

    #[test]
    fn test_keyword_order_first_match_wins() {
        // Both "pix" and "dinheiro" present; "pix" is checked first.
        let q = parse("Leite pix dinheiro").unwrap();
        assert_eq!(q.payment_method, PaymentMethod::Pix);
        assert_eq!(q.name_query, "leite dinheiro");
    }

    #[test]
    fn test_empty_and_missing_name() {
        assert_eq!(parse("   "), Err(QuickSaleError::EmptyInput));
        assert_eq!(parse("pix"), Err(QuickSaleError::MissingName));
        assert_eq!(parse("2 pix"), Err(QuickSaleError::MissingName));
    }

    #[test]
    fn test_resolution_first_match() {
        let products = vec![
            product("Leite Desnatado 1L"),
            product("Leite Integral 1L"),
        ];
        let found = resolve_product(&products, "leite").unwrap();
        assert_eq!(found.name, "Leite Desnatado 1L");

        let found = resolve_product(&products, "integral").unwrap();
        assert_eq!(found.name, "Leite Integral 1L");

        assert!(resolve_product(&products, "queijo").is_none());
    }
}
