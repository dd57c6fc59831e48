use rand::Rng;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AppError, Result};

/// Number of backup codes issued when 2FA is enabled
pub const BACKUP_CODE_COUNT: usize = 10;
const BACKUP_CODE_LEN: usize = 8;

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Generate `len` cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.random()).collect()
}

/// Generate a cryptographically secure random string (hex)
pub fn generate_random_string(length: usize) -> String {
    hex::encode(random_bytes(length))
}

/// Fresh set of single-use backup codes (uppercase, 8 chars each)
pub fn generate_backup_codes() -> Vec<String> {
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(BACKUP_CODE_LEN)
                .collect::<String>()
                .to_uppercase()
        })
        .collect()
}

// ==========================================================================
// TOTP (Time-based One-Time Password) Functions
// ==========================================================================

/// Generate a new TOTP secret (base32 encoded)
pub fn generate_totp_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn create_totp(secret: &str, issuer: &str, account_name: &str) -> Result<TOTP> {
    let secret_bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| AppError::Internal(format!("Invalid TOTP secret: {}", e)))?;

    TOTP::new(
        Algorithm::SHA1,
        6,  // digits
        1,  // skew (one step either side)
        30, // step seconds
        secret_bytes,
        Some(issuer.to_string()),
        account_name.to_string(),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create TOTP: {}", e)))
}

/// Verify a TOTP code against the current time window
pub fn verify_totp(secret: &str, code: &str, issuer: &str, account_name: &str) -> Result<bool> {
    let totp = create_totp(secret, issuer, account_name)?;
    Ok(totp.check_current(code.trim()).unwrap_or(false))
}

/// Current code for a secret; used by tests and the verification flow
pub fn current_totp_code(secret: &str, issuer: &str, account_name: &str) -> Result<String> {
    let totp = create_totp(secret, issuer, account_name)?;
    totp.generate_current()
        .map_err(|e| AppError::Internal(format!("System clock error: {}", e)))
}

/// Get TOTP provisioning URI for QR code generation
pub fn get_totp_provisioning_uri(secret: &str, issuer: &str, account_name: &str) -> Result<String> {
    Ok(create_totp(secret, issuer, account_name)?.get_url())
}

/// Get TOTP QR code as base64-encoded PNG data URL
pub fn get_totp_qr_code_base64(secret: &str, issuer: &str, account_name: &str) -> Result<String> {
    let totp = create_totp(secret, issuer, account_name)?;
    let base64 = totp
        .get_qr_base64()
        .map_err(|e| AppError::Internal(format!("Failed to generate QR code: {}", e)))?;
    Ok(format!("data:image/png;base64,{}", base64))
}
