//! Staff credentials and the request-scoped identity handed to the write path.

use crate::error::{AttendanceError, AttendanceResult};
use crate::manager::AttendanceManager;
use crate::models::{NewStaff, Staff};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use tracing::{info, warn};

/// The staff member on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffContext {
    pub staff_id: i32,
    pub name: String,
    pub email: String,
    pub department: String,
}

impl From<Staff> for StaffContext {
    fn from(staff: Staff) -> Self {
        Self {
            staff_id: staff.id,
            name: staff.name,
            email: staff.email,
            department: staff.department,
        }
    }
}

/// Salts and hashes a password into a PHC string suitable for storage.
pub fn hash_password(password: &str) -> AttendanceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AttendanceError::Credential(e.to_string()))
}

/// Returns `true` if `password` matches the stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Verifies a staff member's credentials and establishes their context.
///
/// Unknown emails and wrong passwords fail the same way.
pub fn authenticate(
    manager: &mut AttendanceManager,
    email: &str,
    password: &str,
) -> AttendanceResult<StaffContext> {
    match manager.find_staff_by_email(email)? {
        Some(staff) if verify_password(password, &staff.password_hash) => {
            info!(staff_id = staff.id, "staff authenticated");
            Ok(staff.into())
        }
        _ => {
            warn!(email, "rejected login");
            Err(AttendanceError::InvalidCredentials)
        }
    }
}

/// Creates a staff account with a freshly hashed password.
pub fn provision_staff(
    manager: &mut AttendanceManager,
    name: &str,
    email: &str,
    department: &str,
    password: &str,
) -> AttendanceResult<StaffContext> {
    let password_hash = hash_password(password)?;

    let staff = manager.insert_staff(&NewStaff {
        name,
        email,
        password_hash: &password_hash,
        department,
    })?;

    info!(staff_id = staff.id, email, "provisioned staff account");

    Ok(staff.into())
}
