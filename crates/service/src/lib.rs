//! Feature services for the Mecanix shop screens.
//! - One service per backend resource, all calling through the gateway client.
//! - Models mirror the backend's JSON; validation runs before create/update.
//! - Client screens can be switched to built-in sample data.

pub mod auth;
pub mod clients;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod resource;
pub mod services;

pub use clients::{client_service, ClientDirectory, ClientService};
pub use errors::ServiceError;
pub use pagination::ListQuery;
pub use resource::{Resource, ResourceService};
pub use services::{
    client_vehicle_service, mechanic_service, order_service, reservation_service, service_service,
    vehicle_service,
};
