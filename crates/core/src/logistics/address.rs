use rand::Rng;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressValidation {
    Confirmed(Address),
    Corrected(Address),
}

impl AddressValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

impl Serialize for AddressValidation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("AddressValidation", 2)?;
        match self {
            Self::Confirmed(address) => {
                state.serialize_field("is_valid", &true)?;
                state.serialize_field("address", address)?;
            }
            Self::Corrected(address) => {
                state.serialize_field("is_valid", &false)?;
                state.serialize_field("suggested_correction", address)?;
            }
        }
        state.end()
    }
}

/// Mock validation: a fair coin decides whether the address is accepted or a
/// correction with a nudged zip code is suggested.
pub fn validate_address<R>(address: Address, rng: &mut R) -> Result<AddressValidation, DomainError>
where
    R: Rng + ?Sized,
{
    let corrected_zip = increment_last_digit(&address.zip_code)?;
    if rng.gen_bool(0.5) {
        return Ok(AddressValidation::Confirmed(address));
    }

    Ok(AddressValidation::Corrected(Address { zip_code: corrected_zip, ..address }))
}

/// Bumps the final digit of `zip_code` by one, wrapping 9 to 0 so the
/// result keeps its length.
pub fn increment_last_digit(zip_code: &str) -> Result<String, DomainError> {
    let trimmed = zip_code.trim();
    let invalid = || DomainError::InvalidZipCode(zip_code.to_string());

    let last = trimmed.chars().last().ok_or_else(invalid)?;
    let digit = last.to_digit(10).ok_or_else(invalid)?;
    let next = char::from_digit((digit + 1) % 10, 10).ok_or_else(invalid)?;

    let mut corrected = trimmed[..trimmed.len() - last.len_utf8()].to_string();
    corrected.push(next);
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{increment_last_digit, validate_address, Address, AddressValidation};
    use crate::errors::DomainError;

    fn address(zip_code: &str) -> Address {
        Address {
            street: "1 Harbor Way".to_string(),
            city: "Oakland".to_string(),
            state: "CA".to_string(),
            zip_code: zip_code.to_string(),
        }
    }

    #[test]
    fn last_digit_is_incremented() {
        assert_eq!(increment_last_digit("94107"), Ok("94108".to_string()));
        assert_eq!(increment_last_digit(" 10001 "), Ok("10002".to_string()));
    }

    #[test]
    fn nine_wraps_to_zero_without_growing() {
        assert_eq!(increment_last_digit("94109"), Ok("94100".to_string()));
        assert_eq!(increment_last_digit("9"), Ok("0".to_string()));
    }

    #[test]
    fn zip_without_trailing_digit_is_rejected() {
        assert_eq!(increment_last_digit(""), Err(DomainError::InvalidZipCode(String::new())));
        assert!(increment_last_digit("9410A").is_err());
    }

    #[test]
    fn both_outcomes_appear_with_the_expected_shapes() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut confirmed = 0;
        let mut corrected = 0;

        for _ in 0..200 {
            let outcome = validate_address(address("94107"), &mut rng).expect("valid zip");
            let payload = serde_json::to_value(&outcome).expect("serializable outcome");
            let keys = payload.as_object().map(|object| object.len());
            assert_eq!(keys, Some(2));

            match outcome {
                AddressValidation::Confirmed(ref original) => {
                    confirmed += 1;
                    assert_eq!(payload["is_valid"], true);
                    assert_eq!(original, &address("94107"));
                    assert_eq!(payload["address"]["zip_code"], "94107");
                }
                AddressValidation::Corrected(ref suggestion) => {
                    corrected += 1;
                    assert_eq!(payload["is_valid"], false);
                    assert_eq!(suggestion.zip_code, "94108");
                    assert_eq!(suggestion.street, "1 Harbor Way");
                    assert_eq!(payload["suggested_correction"]["zip_code"], "94108");
                }
            }
        }

        assert!(confirmed > 0, "expected at least one confirmed address");
        assert!(corrected > 0, "expected at least one corrected address");
    }
}
