use rust_decimal::Decimal;
use validator::ValidationError;

/// Most decimal places an amount may carry (`NUMERIC(12, 2)`)
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount the `expenses.amount` column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, AMOUNT_SCALE); // 999_999_999_999 * 10^-2

fn amount_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("invalid_amount");
    error.message = Some(message.into());
    error
}

/// Validates that an amount is non-negative, has at most two decimal places
/// and fits the stored column
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(amount_error("Amount must not be negative"));
    }
    // Trailing zeros ("12.500") do not count as extra precision
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(amount_error("Amount must have at most two decimal places"));
    }
    if *amount > MAX_AMOUNT {
        return Err(amount_error("Amount must not exceed 9999999999.99"));
    }
    Ok(())
}
