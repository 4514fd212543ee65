//! Business logic services for the Medical Supply Inventory Platform

pub mod alert;
pub mod analytics;
pub mod audit;
pub mod category;
pub mod identity;
pub mod inventory;
pub mod reporting;
pub mod scheduler;
pub mod seed;
pub mod supplier;
pub mod supply;

pub use alert::AlertService;
pub use analytics::AnalyticsService;
pub use audit::AuditService;
pub use category::CategoryService;
pub use identity::IdentityService;
pub use inventory::InventoryService;
pub use reporting::ReportingService;
pub use seed::SeedService;
pub use supplier::SupplierService;
pub use supply::SupplyService;
