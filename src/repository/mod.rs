//! Database repository layer

pub mod audit_repo;
pub mod company_repo;
pub mod currency_repo;
pub mod default_flag;
pub mod menu_repo;
pub mod role_repo;
pub mod user_repo;

pub use audit_repo::AuditRepository;
pub use company_repo::CompanyRepository;
pub use currency_repo::CurrencyRepository;
pub use default_flag::{DefaultFlagRepository, DefaultFlagged};
pub use menu_repo::MenuRepository;
pub use role_repo::RoleRepository;
pub use user_repo::UserRepository;
