//! Validation utilities for the Retail Back Office

use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate a movement/order quantity (whole units, at least 1)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Validate a money amount is strictly positive
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be positive");
    }
    Ok(())
}

/// Validate a price is not negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate product code format (3-16 uppercase alphanumeric, dashes allowed)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Product code must be at least 3 characters");
    }
    if code.len() > 16 {
        return Err("Product code must be at most 16 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Product code must be uppercase alphanumeric (dashes allowed)");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate phone number: 7-15 digits, optional leading +
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let trimmed = phone.strip_prefix('+').unwrap_or(phone);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err("Phone number must have 7-15 digits");
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number may only contain digits, spaces and dashes");
    }
    Ok(())
}

/// Validate a non-empty display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    if name.len() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(dec("0.01")).is_ok());
        assert!(validate_amount(dec("1500")).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec("-10")).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(dec("99.99")).is_ok());
        assert!(validate_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_product_code_valid() {
        assert!(validate_product_code("SKU").is_ok());
        assert!(validate_product_code("PRD-001").is_ok());
        assert!(validate_product_code("A1B2C3D4E5F6G7H8").is_ok());
    }

    #[test]
    fn test_validate_product_code_invalid() {
        assert!(validate_product_code("AB").is_err()); // Too short
        assert!(validate_product_code("A1B2C3D4E5F6G7H8X").is_err()); // Too long
        assert!(validate_product_code("prd-001").is_err()); // Lowercase
        assert!(validate_product_code("PRD_001").is_err()); // Underscore
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("sr@example.com").is_ok());
        assert!(validate_email("user.name@domain.co").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0171234567").is_ok());
        assert!(validate_phone("+880 171-234-5678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("12345678901234567").is_err());
        assert!(validate_phone("abcdefgh").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Dhanmondi Outlet").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(121)).is_err());
    }
}
