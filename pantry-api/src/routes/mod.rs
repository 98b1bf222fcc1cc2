/// API route handlers
///
/// Handlers are grouped by resource:
///
/// - `health`: `/up` and the fallback for unknown paths
/// - `auth`: sign-up, login and logout
/// - `spaces`, `storages`, `items`: the inventory hierarchy
/// - `purchase_sessions`: shopping trips and their lines
/// - `subscription`, `profile`: the signed-in user's own records

pub mod auth;
pub mod health;
pub mod items;
pub mod profile;
pub mod purchase_sessions;
pub mod spaces;
pub mod storages;
pub mod subscription;
