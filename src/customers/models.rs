// Customer data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Customer record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Acme")]
    pub name: String,
    #[schema(example = "sales@acme.test")]
    pub email: Option<String>,
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    #[schema(example = "Acme Corp")]
    pub company: Option<String>,
    #[schema(example = "1 Main St")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a customer
///
/// Optional fields are free-form and stored exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Acme")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

/// Request DTO for a partial update
///
/// Absent fields keep their stored value. An optional field sent as
/// `null` is cleared; `name` can never be cleared, so a `null` name is
/// rejected while parsing the body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[serde(default, deserialize_with = "present")]
    #[validate(custom = "crate::validation::validate_not_blank")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

/// Marks a key that appeared in the body, including one set to `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl UpdateCustomerRequest {
    /// Apply the supplied fields to a stored record
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            customer.phone = phone.clone();
        }
        if let Some(company) = &self.company {
            customer.company = company.clone();
        }
        if let Some(address) = &self.address {
            customer.address = address.clone();
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerListResponse {
    #[schema(example = true)]
    pub success: bool,
    pub customers: Vec<Customer>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    #[schema(example = true)]
    pub success: bool,
    pub customer: Customer,
}

/// Plain `{success, message}` acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Customer deleted successfully!")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
