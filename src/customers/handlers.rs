// HTTP handlers for customer endpoints
// Every route here sits behind `require_auth`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::customers::models::{
    CreateCustomerRequest, CustomerListResponse, CustomerResponse, MessageResponse,
    UpdateCustomerRequest,
};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// List all customers
/// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "All customers, newest first", body = CustomerListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers_handler(
    State(state): State<AppState>,
) -> Result<Json<CustomerListResponse>, ApiError> {
    let customers = state.customer_service.list_customers().await?;

    Ok(Json(CustomerListResponse {
        success: true,
        customers,
    }))
}

/// Create a customer
/// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Name missing or blank", body = ErrorResponse,
            example = json!({"success": false, "message": "Field 'name' is required"})),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_customer_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let Json(request) = payload?;
    let customer = state.customer_service.create_customer(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse {
            success: true,
            customer,
        }),
    ))
}

/// Update a customer
/// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(
        ("id" = String, Path, description = "Customer ID (UUID)")
    ),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Supplied name is blank", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse,
            example = json!({"success": false, "message": "Customer not found"})),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn update_customer_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let Json(request) = payload?;
    let customer = state.customer_service.update_customer(&id, request).await?;

    Ok(Json(CustomerResponse {
        success: true,
        customer,
    }))
}

/// Delete a customer
/// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(
        ("id" = String, Path, description = "Customer ID (UUID)")
    ),
    responses(
        (status = 200, description = "Customer deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_customer_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.customer_service.delete_customer(&id).await?;

    Ok(Json(MessageResponse::new("Customer deleted successfully!")))
}
