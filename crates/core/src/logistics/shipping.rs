use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::DomainError;

/// Package size in inches and weight in pounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackageMeasurements {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
}

impl PackageMeasurements {
    pub fn from_f64(
        length: f64,
        width: f64,
        height: f64,
        weight: f64,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            length: measurement("length", length)?,
            width: measurement("width", width)?,
            height: measurement("height", height)?,
            weight: measurement("weight", weight)?,
        })
    }

    pub fn volume(&self) -> Result<Decimal, DomainError> {
        self.length
            .checked_mul(self.width)
            .and_then(|area| area.checked_mul(self.height))
            .ok_or(DomainError::CostOverflow)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub package_dimensions: String,
    pub package_weight: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_cost: Decimal,
}

/// `5.00 + 0.01 * volume + 0.50 * weight`, rounded to cents.
///
/// Zero and negative measurements are priced as given.
pub fn quote_shipping(package: PackageMeasurements) -> Result<ShippingQuote, DomainError> {
    let base = Decimal::new(500, 2);
    let per_cubic_inch = Decimal::new(1, 2);
    let per_pound = Decimal::new(50, 2);

    let volume_charge =
        package.volume()?.checked_mul(per_cubic_inch).ok_or(DomainError::CostOverflow)?;
    let weight_charge = package.weight.checked_mul(per_pound).ok_or(DomainError::CostOverflow)?;
    let shipping_cost = base
        .checked_add(volume_charge)
        .and_then(|cost| cost.checked_add(weight_charge))
        .ok_or(DomainError::CostOverflow)?
        .round_dp(2);

    Ok(ShippingQuote {
        package_dimensions: format!(
            "{}x{}x{} inches",
            package.length.normalize(),
            package.width.normalize(),
            package.height.normalize()
        ),
        package_weight: format!("{} lbs", package.weight.normalize()),
        shipping_cost,
    })
}

fn measurement(field: &'static str, value: f64) -> Result<Decimal, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::InvalidMeasurement { field });
    }
    Decimal::from_f64(value).ok_or(DomainError::InvalidMeasurement { field })
}
