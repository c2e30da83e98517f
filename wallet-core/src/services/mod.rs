//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod credentials;
pub mod ledger;
pub mod logging;
pub mod migration;
pub mod registry;

pub use credentials::CredentialHasher;
pub use ledger::{DuplicatePolicy, LedgerEngine};
pub use logging::{EntryPoint, FailureCount, LogEntry, LogEvent, LogFilter, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use registry::AccountRegistry;
