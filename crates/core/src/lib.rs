pub mod config;
pub mod errors;
pub mod logistics;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use errors::{DomainError, ToolError, TurnError};
pub use logistics::{
    Address, AddressValidation, CompanyDirectory, CompanyInfo, DeliveryEstimate, OrderBook,
    OrderId, OrderStatus, PackageMeasurements, ShippingQuote, TrackingReport,
};
