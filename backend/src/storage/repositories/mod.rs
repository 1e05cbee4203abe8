pub mod percentage_repository;
pub mod refresh_token_repository;
pub mod transaction_repository;
pub mod user_repository;

pub use percentage_repository::PercentageRepository;
pub use refresh_token_repository::RefreshTokenRepository;
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;
