//! Shipping addresses captured at checkout.

use serde::{Deserialize, Serialize};

use super::validation::{ValidationErrors, require_text};

/// A shipping address as submitted by a client.
///
/// Every field is optional here so that a missing field is reported as a
/// field error by [`ShippingAddressInput::validate`] instead of failing JSON
/// decoding outright.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// A complete shipping address. All five parts are non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddressInput {
    /// Check every part, reporting failures as `{prefix}.{field}`.
    ///
    /// # Errors
    ///
    /// Returns all missing or blank parts at once.
    pub fn validate(&self, prefix: &str) -> Result<ShippingAddress, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut part = |name: &str, value: Option<&str>| {
            require_text(&mut errors, &format!("{prefix}.{name}"), value, 1)
        };

        let street = part("street", self.street.as_deref());
        let city = part("city", self.city.as_deref());
        let state = part("state", self.state.as_deref());
        let zip_code = part("zipCode", self.zip_code.as_deref());
        let country = part("country", self.country.as_deref());

        match (street, city, state, zip_code, country) {
            (Some(street), Some(city), Some(state), Some(zip_code), Some(country)) => {
                Ok(ShippingAddress {
                    street,
                    city,
                    state,
                    zip_code,
                    country,
                })
            }
            _ => Err(errors),
        }
    }
}
