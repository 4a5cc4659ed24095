//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Storefront database URL from the environment.
///
/// Loads `.env` first, then reads `STOREFRONT_DATABASE_URL`, falling back
/// to `DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
