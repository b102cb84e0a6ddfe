// Public API
pub mod cli;
pub mod commands;

// Core domain types
pub mod adapter;
pub mod executor;
pub mod package_manager;
pub mod packages;
pub mod resolver;
pub mod safety;

// Host environment
pub mod paths;
pub mod platform;
pub mod settings;
mod ui;

// Re-export main types
pub use adapter::Adapter;
pub use executor::{AuditLog, Elevation, ExecutionResult, Executor, ProcessRunner, ShellRunner};
pub use package_manager::PackageManager;
pub use packages::{LoadError, PackageEntry, PackageTable};
pub use resolver::{ResolvedPackage, Resolver};
pub use safety::Rejection;
pub use settings::Settings;
