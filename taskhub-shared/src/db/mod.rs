/// Database plumbing: connection pool and migrations
///
/// Queries themselves live on the models (see [`crate::models`]) and are
/// reached through [`crate::store::PgStore`].

pub mod migrations;
pub mod pool;
