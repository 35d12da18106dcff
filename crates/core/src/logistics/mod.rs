//! Mock logistics back office.
//!
//! Every operation here is an in-memory stand-in for a carrier or order
//! system. The agent crate wraps each one as a model-callable tool.

pub mod address;
pub mod company;
pub mod delivery;
pub mod orders;
pub mod shipping;

use chrono::{DateTime, SecondsFormat, Utc};

pub use address::{validate_address, Address, AddressValidation};
pub use company::{CompanyDirectory, CompanyInfo};
pub use delivery::{estimate_delivery, DeliveryEstimate};
pub use orders::{OrderBook, OrderId, OrderRecord, OrderStatus, TrackingReport};
pub use shipping::{quote_shipping, PackageMeasurements, ShippingQuote};

/// ISO-8601 rendering shared by every timestamp a tool reports.
pub fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
