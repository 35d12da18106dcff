use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logex_core::errors::ToolError;
use logex_core::logistics::{
    address, estimate_delivery, quote_shipping, Address, CompanyDirectory, OrderBook,
    PackageMeasurements,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{lenient_f64, lenient_string, parse_arguments, Tool};

/// Random source shared by the mock tools that roll dice.
pub type SharedRng = Arc<Mutex<StdRng>>;

#[derive(Clone, Debug)]
pub struct CatalogOptions {
    pub company_name: String,
    /// Fixes the random tools' outcomes; entropy-seeded when `None`.
    pub seed: Option<u64>,
    /// Anchor for the order table's delivery dates.
    pub now: DateTime<Utc>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self { company_name: "Logex".to_string(), seed: None, now: Utc::now() }
    }
}

impl CatalogOptions {
    pub(crate) fn shared_rng(&self) -> SharedRng {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Arc::new(Mutex::new(rng))
    }

    pub(crate) fn order_book(&self) -> Arc<OrderBook> {
        Arc::new(OrderBook::fixtures(self.now))
    }

    pub(crate) fn company_directory(&self) -> CompanyDirectory {
        CompanyDirectory::new(self.company_name.clone())
    }
}

fn lock_rng(rng: &SharedRng) -> MutexGuard<'_, StdRng> {
    rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_payload<T>(tool: &str, value: &T) -> Result<Value, ToolError>
where
    T: Serialize,
{
    serde_json::to_value(value).map_err(|error| ToolError::invalid(tool, error.to_string()))
}

pub struct TrackOrderTool {
    orders: Arc<OrderBook>,
}

impl TrackOrderTool {
    pub fn new(orders: Arc<OrderBook>) -> Self {
        Self { orders }
    }
}

#[derive(Debug, Deserialize)]
struct TrackOrderArgs {
    #[serde(deserialize_with = "lenient_string")]
    order_id: String,
}

#[async_trait]
impl Tool for TrackOrderTool {
    fn name(&self) -> &'static str {
        "track_order"
    }

    fn description(&self) -> &'static str {
        "Track the status of an order. Returns the status, details, and either the estimated \
         delivery time (open orders) or the delivery date (delivered orders)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "Unique order identifier, e.g. ORD123456"
                }
            },
            "required": ["order_id"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: TrackOrderArgs = parse_arguments(self.name(), input)?;
        to_payload(self.name(), &self.orders.track(&args.order_id))
    }
}

pub struct EstimateDeliveryTool {
    rng: SharedRng,
}

impl EstimateDeliveryTool {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[derive(Debug, Deserialize)]
struct EstimateDeliveryArgs {
    #[serde(deserialize_with = "lenient_string")]
    order_id: String,
    #[serde(deserialize_with = "lenient_string")]
    destination_zip: String,
}

#[async_trait]
impl Tool for EstimateDeliveryTool {
    fn name(&self) -> &'static str {
        "estimate_delivery_time"
    }

    fn description(&self) -> &'static str {
        "Estimate when an order will arrive at a destination zip code. Returns an ISO-8601 \
         estimated delivery date."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "Unique order identifier"
                },
                "destination_zip": {
                    "type": "string",
                    "description": "Delivery destination zip code"
                }
            },
            "required": ["order_id", "destination_zip"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: EstimateDeliveryArgs = parse_arguments(self.name(), input)?;
        let estimate = {
            let mut rng = lock_rng(&self.rng);
            estimate_delivery(&args.order_id, &args.destination_zip, Utc::now(), &mut *rng)
        };
        to_payload(self.name(), &estimate)
    }
}

pub struct ShippingCostTool;

#[derive(Debug, Deserialize)]
struct ShippingCostArgs {
    #[serde(deserialize_with = "lenient_f64")]
    length: f64,
    #[serde(deserialize_with = "lenient_f64")]
    width: f64,
    #[serde(deserialize_with = "lenient_f64")]
    height: f64,
    #[serde(deserialize_with = "lenient_f64")]
    weight: f64,
}

#[async_trait]
impl Tool for ShippingCostTool {
    fn name(&self) -> &'static str {
        "calculate_shipping_cost"
    }

    fn description(&self) -> &'static str {
        "Calculate the shipping cost of a package from its dimensions in inches and its \
         weight in pounds."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "length": { "type": "number", "description": "Package length in inches" },
                "width": { "type": "number", "description": "Package width in inches" },
                "height": { "type": "number", "description": "Package height in inches" },
                "weight": { "type": "number", "description": "Package weight in pounds" }
            },
            "required": ["length", "width", "height", "weight"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: ShippingCostArgs = parse_arguments(self.name(), input)?;
        let package =
            PackageMeasurements::from_f64(args.length, args.width, args.height, args.weight)
                .map_err(|error| ToolError::from_domain(self.name(), error))?;
        let quote =
            quote_shipping(package).map_err(|error| ToolError::from_domain(self.name(), error))?;
        to_payload(self.name(), &quote)
    }
}

pub struct ValidateAddressTool {
    rng: SharedRng,
}

impl ValidateAddressTool {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[derive(Debug, Deserialize)]
struct ValidateAddressArgs {
    street: String,
    city: String,
    state: String,
    #[serde(deserialize_with = "lenient_string")]
    zip_code: String,
}

#[async_trait]
impl Tool for ValidateAddressTool {
    fn name(&self) -> &'static str {
        "validate_address"
    }

    fn description(&self) -> &'static str {
        "Validate a postal address. Returns whether it is valid and, if not, a suggested \
         correction."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "street": { "type": "string", "description": "Street address" },
                "city": { "type": "string", "description": "City name" },
                "state": { "type": "string", "description": "State abbreviation" },
                "zip_code": { "type": "string", "description": "ZIP code" }
            },
            "required": ["street", "city", "state", "zip_code"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: ValidateAddressArgs = parse_arguments(self.name(), input)?;
        let candidate = Address {
            street: args.street,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
        };
        let outcome = {
            let mut rng = lock_rng(&self.rng);
            address::validate_address(candidate, &mut *rng)
        }
        .map_err(|error| ToolError::from_domain(self.name(), error))?;
        to_payload(self.name(), &outcome)
    }
}

pub struct CompanyInfoTool {
    directory: CompanyDirectory,
}

impl CompanyInfoTool {
    pub fn new(directory: CompanyDirectory) -> Self {
        Self { directory }
    }
}

#[derive(Debug, Deserialize)]
struct CompanyInfoArgs {
    topic: String,
}

#[async_trait]
impl Tool for CompanyInfoTool {
    fn name(&self) -> &'static str {
        "retrieve_company_information"
    }

    fn description(&self) -> &'static str {
        "Look up general company information: overview, services, hours, contact, pickup, \
         or claims."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "enum": self.directory.topics(),
                    "description": "Information topic"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: CompanyInfoArgs = parse_arguments(self.name(), input)?;
        to_payload(self.name(), &self.directory.lookup(&args.topic))
    }
}
