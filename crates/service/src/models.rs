//! Shop entities as the backend serves them.
//!
//! Ids are assigned by the backend: they are `None` on create payloads and
//! left out of the serialized body.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::resource::Resource;

fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::required(field));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

impl Resource for Client {
    const PATH: &'static str = "/client";
    const NAME: &'static str = "client";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(ServiceError::Validation("email is not valid".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub plate: String,
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Resource for Vehicle {
    const PATH: &'static str = "/vehicle";
    const NAME: &'static str = "vehicle";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        require("plate", &self.plate)?;
        require("brand", &self.brand)?;
        require("model", &self.model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl Resource for Service {
    const PATH: &'static str = "/service";
    const NAME: &'static str = "service";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ServiceError::Validation("price must be zero or positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool { true }

impl Resource for Mechanic {
    const PATH: &'static str = "/mechanic";
    const NAME: &'static str = "mechanic";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A booked repair; the backend also exposes these as orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client_id: i64,
    pub vehicle_id: i64,
    pub service_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_id: Option<i64>,
    /// ISO-8601 date-time as sent by the backend.
    pub date: String,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Resource for Reservation {
    const PATH: &'static str = "/reservation";
    const NAME: &'static str = "reservation";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        require("date", &self.date)?;
        for (field, id) in [("clientId", self.client_id), ("vehicleId", self.vehicle_id), ("serviceId", self.service_id)] {
            if id <= 0 {
                return Err(ServiceError::required(field));
            }
        }
        Ok(())
    }
}

/// Ownership link between a client and a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientVehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client_id: i64,
    pub vehicle_id: i64,
}

impl Resource for ClientVehicle {
    const PATH: &'static str = "/client-vehicle";
    const NAME: &'static str = "client-vehicle";

    fn id(&self) -> Option<i64> { self.id }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.client_id <= 0 {
            return Err(ServiceError::required("clientId"));
        }
        if self.vehicle_id <= 0 {
            return Err(ServiceError::required("vehicleId"));
        }
        Ok(())
    }
}
