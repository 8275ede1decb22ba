//! Services layer for admin-service.
//!
//! Rights registration, token issuance, user and password management and
//! the cache-aside wrapper, all on top of the [`AdminStore`] and
//! [`CacheStore`] seams.

pub mod cache;
pub mod comparers;
mod database;
pub mod error;
pub mod games;
pub mod memory;
pub mod metrics;
pub mod passwords;
pub mod redis;
pub mod rights;
pub mod store;
pub mod token;
pub mod tokens;
pub mod users;

pub use cache::CacheService;
pub use comparers::{EqualityComparer, ExternalGamesComparer, RightsComparer};
pub use database::Database;
pub use error::ServiceError;
pub use games::GamesService;
pub use memory::InMemoryStore;
pub use passwords::PasswordsService;
pub use redis::{CacheStore, MockCacheStore, RedisService};
pub use rights::RightsService;
pub use store::AdminStore;
pub use token::TokenBuilder;
pub use tokens::TokensService;
pub use users::UsersService;
