//! Password hashing using Argon2id
//!
//! This module provides secure password hashing following the same patterns
//! as florida-top-contractors and housecleaning projects.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Ok(String)` - The hashed password in PHC string format
/// * `Err(String)` - Error message if hashing fails
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("Failed to hash password: {}", e))
}

/// Verify a password against a hash
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored password hash in PHC string format
///
/// # Returns
/// * `true` if the password matches
/// * `false` if it doesn't match or if verification fails
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Validate password strength
///
/// Requirements:
/// - At least 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
///
/// # Returns
/// * `Ok(())` if password meets requirements
/// * `Err(String)` with explanation if it doesn't
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }

    Ok(())
}

/// Validate email format (basic validation)
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim().to_lowercase();

    if email.len() < 5 {
        return Err("Email is too short".to_string());
    }

    if !email.contains('@') {
        return Err("Email must contain @".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err("Invalid email format".to_string());
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err("Email local part cannot be empty".to_string());
    }

    if !domain.contains('.') {
        return Err("Email domain must contain a dot".to_string());
    }

    Ok(())
}
