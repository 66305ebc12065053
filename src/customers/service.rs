// Customer service - business logic layer

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::customers::{
    models::{CreateCustomerRequest, Customer, UpdateCustomerRequest},
    repository::CustomerRepository,
};
use crate::error::ApiError;

const RESOURCE: &str = "Customer";

/// Service layer for customer records
///
/// Every authenticated user shares one workspace: there is no per-user
/// ownership, so no operation takes the caller's id.
#[derive(Clone)]
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    /// Resolve a path id; anything that is not a UUID cannot name a record
    pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(raw).map_err(|_| ApiError::not_found(RESOURCE, raw))
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        let customers = self.repository.list().await?;
        tracing::debug!("Retrieved {} customers", customers.len());
        Ok(customers)
    }

    pub async fn create_customer(&self, request: CreateCustomerRequest) -> Result<Customer, ApiError> {
        request.validate()?;

        let customer = self.repository.create(&request).await?;

        tracing::info!("Created customer with id: {}", customer.id);
        Ok(customer)
    }

    /// Replace the supplied fields of an existing record
    pub async fn update_customer(
        &self,
        id: &str,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, ApiError> {
        let id = Self::parse_id(id)?;
        request.validate()?;

        let customer = self
            .repository
            .update(id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

        tracing::info!("Updated customer with id: {}", id);
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        let id = Self::parse_id(id)?;

        if !self.repository.delete(id).await? {
            return Err(ApiError::not_found(RESOURCE, id));
        }

        tracing::info!("Deleted customer with id: {}", id);
        Ok(())
    }
}
