// Service exports
pub mod auth;
pub mod formulas;
pub mod postgres;
pub mod seed;

pub use auth::{hash_password, reject_unknown_user, verify_password, AuthError, Claims, TokenService};
pub use formulas::FormulaCache;
pub use postgres::{PostgresClient, PostgresError, ReferenceTable};
pub use seed::{seed_reference_data, ReferenceData, SeedError, SeedReport};
