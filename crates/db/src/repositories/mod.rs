//! Repository structs, one per table. All methods take `&PgPool` and return
//! `Result<_, sqlx::Error>`.

pub mod config_repo;
pub mod entry_repo;
pub mod session_repo;
pub mod user_preference_repo;

pub use config_repo::ConfigRepo;
pub use entry_repo::EntryRepo;
pub use session_repo::SessionRepo;
pub use user_preference_repo::UserPreferenceRepo;
