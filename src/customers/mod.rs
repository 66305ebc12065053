// Customer records module
// CRUD over a single shared set of customers, available to any authenticated user

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use handlers::{
    create_customer_handler, delete_customer_handler, list_customers_handler,
    update_customer_handler,
};
pub use models::{
    CreateCustomerRequest, Customer, CustomerListResponse, CustomerResponse, MessageResponse,
    UpdateCustomerRequest,
};
pub use repository::{CustomerRepository, InMemoryCustomerRepository, PgCustomerRepository};
pub use service::CustomerService;
