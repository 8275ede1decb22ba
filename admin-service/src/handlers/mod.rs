pub mod metrics;
pub mod passwords;
pub mod rights;
pub mod tokens;
pub mod users;
