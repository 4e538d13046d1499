//! Validation utilities shared by the ledger and the HTTP layer

use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Entry and exit quantities must be positive
pub fn validate_movement_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

pub fn validate_minimum_stock(minimum: i64) -> Result<(), &'static str> {
    if minimum < 0 {
        return Err("Minimum stock cannot be negative");
    }
    Ok(())
}

/// Shelf labels end up inside location codes, so only letters and digits are allowed
pub fn validate_shelf(shelf: &str) -> Result<(), &'static str> {
    if shelf.trim().is_empty() {
        return Err("Shelf is required");
    }
    if shelf.len() > 20 {
        return Err("Shelf must be at most 20 characters");
    }
    if !shelf.chars().all(|c| c.is_alphanumeric()) {
        return Err("Shelf must contain only letters and digits");
    }
    Ok(())
}

pub fn validate_level(level: u32) -> Result<(), &'static str> {
    if level < 1 {
        return Err("Level must be at least 1");
    }
    Ok(())
}

/// Validate a 24h `HH:MM` time of day
pub fn validate_time_of_day(time: &str) -> Result<(), &'static str> {
    let (hours, minutes) = time.split_once(':').ok_or("Time must be in HH:MM format")?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err("Time must be in HH:MM format");
    }
    let hours: u32 = hours.parse().map_err(|_| "Time must be in HH:MM format")?;
    let minutes: u32 = minutes.parse().map_err(|_| "Time must be in HH:MM format")?;
    if hours > 23 || minutes > 59 {
        return Err("Time is out of range");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 50 {
        return Err("Username must be at most 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err("Username may only contain letters, digits, '.', '_' and '-'");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}
