use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use super::iso8601;

pub const MIN_TRANSIT_DAYS: i64 = 1;
pub const MAX_TRANSIT_DAYS: i64 = 7;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryEstimate {
    pub order_id: String,
    pub destination_zip: String,
    pub estimated_delivery: String,
}

/// Picks a delivery date one to seven days after `now`. No carrier data is
/// consulted; the destination is echoed back unchanged.
pub fn estimate_delivery<R>(
    order_id: &str,
    destination_zip: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> DeliveryEstimate
where
    R: Rng + ?Sized,
{
    let transit_days = rng.gen_range(MIN_TRANSIT_DAYS..=MAX_TRANSIT_DAYS);
    DeliveryEstimate {
        order_id: order_id.to_string(),
        destination_zip: destination_zip.to_string(),
        estimated_delivery: iso8601(now + Duration::days(transit_days)),
    }
}
