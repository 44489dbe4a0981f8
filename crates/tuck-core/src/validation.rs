//! # Validation Module
//!
//! Form input validation for the item and order editors.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  └── Raw text from inputs, parsed tolerantly (parse_quantity)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Names, prices, quantities, capacities                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Stock ledger                                                 │
//! │  └── Does the quantity fit in what is left?                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;

use crate::error::ValidationError;
use crate::{MAX_NAME_LENGTH, MAX_STORED_NUMBER};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Tolerant Parsing
// =============================================================================

/// Parses a quantity typed into a form field.
///
/// Reads the leading integer the way a browser's `parseInt` would
/// (`"3 buns"` → 3, `" 12"` → 12). Empty, non-numeric and negative input all
/// come back as `0`, which every caller treats as "nothing requested".
///
/// ## Example
/// ```rust
/// use tuck_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity("4"), 4);
/// assert_eq!(parse_quantity("4.9"), 4);
/// assert_eq!(parse_quantity("abc"), 0);
/// assert_eq!(parse_quantity("-2"), 0);
/// ```
pub fn parse_quantity(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(n) if !negative => n,
        _ => 0,
    }
}

/// Reads a quantity-like field out of a store document.
///
/// Accepts integers, floats (truncated) and numeric strings. Missing, null,
/// boolean, negative and otherwise malformed values read as `0`. Values above
/// [`MAX_STORED_NUMBER`] are clamped to it.
pub fn lenient_quantity(value: &Value) -> i64 {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_quantity(s),
        _ => 0,
    };
    n.clamp(0, MAX_STORED_NUMBER)
}

/// Reads an amount in rands (`12.5`, `"12.50"`) as whole cents, rounding to
/// the nearest cent. Malformed and negative values read as `0`.
pub fn lenient_rands(value: &Value) -> i64 {
    let rands = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match rands.filter(|r| r.is_finite() && *r > 0.0) {
        // The float-to-int cast saturates, the clamp bounds it for the ledger.
        Some(r) => ((r * 100.0).round() as i64).clamp(0, MAX_STORED_NUMBER),
        None => 0,
    }
}

/// Reads a document flag. Only a JSON `true` counts as set.
pub fn lenient_bool(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// Reads a text field. Numbers keep their JSON text, anything else is empty.
pub fn lenient_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use tuck_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Hot dog").is_ok());
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_name("item name", name)
}

/// Validates the customer name on a preorder.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_name("customer name", name)
}

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity against a configurable ceiling.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
pub fn validate_quantity_within(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock capacity. Zero is allowed (pool closed).
pub fn validate_stock(field: &str, stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}
