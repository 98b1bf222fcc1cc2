//! Authentication utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and length checks
//! - [`jwt`]: JWT token generation and validation
//! - [`middleware`]: bearer token extraction, revocation check, [`AuthContext`](middleware::AuthContext)
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use pantry_shared::auth::jwt::{create_token, Claims};
//! use pantry_shared::auth::password::{hash_password, verify_password};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash)?);
//!
//! let claims = Claims::new(Uuid::new_v4(), Duration::hours(24));
//! let token = create_token(&claims, "secret-key-at-least-32-bytes-long!")?;
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod middleware;
pub mod password;
