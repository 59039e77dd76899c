//! One constructor per backend resource.

use std::sync::Arc;

use gateway::endpoint::join_path;
use gateway::ApiClient;
use tracing::instrument;

use crate::errors::ServiceError;
use crate::models::{ClientVehicle, Mechanic, Reservation, Service, Vehicle};
use crate::resource::{Resource, ResourceService};

pub type VehicleService = ResourceService<Vehicle>;
pub type ServiceCatalog = ResourceService<Service>;
pub type MechanicService = ResourceService<Mechanic>;
pub type ReservationService = ResourceService<Reservation>;

/// Path under which older backends serve reservations.
pub const ORDER_PATH: &str = "/order";

pub fn vehicle_service(client: Arc<ApiClient>) -> VehicleService {
    ResourceService::new(client)
}

pub fn service_service(client: Arc<ApiClient>) -> ServiceCatalog {
    ResourceService::new(client)
}

pub fn mechanic_service(client: Arc<ApiClient>) -> MechanicService {
    ResourceService::new(client)
}

pub fn reservation_service(client: Arc<ApiClient>) -> ReservationService {
    ResourceService::new(client)
}

pub fn order_service(client: Arc<ApiClient>) -> ReservationService {
    ResourceService::at(client, ORDER_PATH)
}

/// Client/vehicle ownership links, plus the per-client vehicle lookup.
#[derive(Clone)]
pub struct ClientVehicleService {
    links: ResourceService<ClientVehicle>,
}

pub fn client_vehicle_service(client: Arc<ApiClient>) -> ClientVehicleService {
    ClientVehicleService { links: ResourceService::new(client) }
}

impl ClientVehicleService {
    pub fn links(&self) -> &ResourceService<ClientVehicle> {
        &self.links
    }

    /// `GET /client-vehicle/client/{id}`
    #[instrument(skip(self))]
    pub async fn vehicles_of_client(&self, client_id: i64) -> Result<Vec<Vehicle>, ServiceError> {
        let path = join_path(ClientVehicle::PATH, ["client".to_string(), client_id.to_string()]);
        Ok(self.links.client().get(&path).await?)
    }

    #[instrument(skip(self))]
    pub async fn link(&self, client_id: i64, vehicle_id: i64) -> Result<ClientVehicle, ServiceError> {
        self.links
            .create(&ClientVehicle { id: None, client_id, vehicle_id })
            .await
    }

    pub async fn unlink(&self, link_id: i64) -> Result<(), ServiceError> {
        self.links.delete(link_id).await
    }

    /// Register a vehicle and link it to its owner in one step.
    pub async fn register_for_client(
        &self,
        vehicles: &VehicleService,
        client_id: i64,
        vehicle: &Vehicle,
    ) -> Result<Vehicle, ServiceError> {
        let created = vehicles.create(vehicle).await?;
        let vehicle_id = created
            .id
            .ok_or_else(|| ServiceError::Validation(format!("backend returned no id for vehicle {}", created.plate)))?;
        self.link(client_id, vehicle_id).await?;
        Ok(created)
    }
}
