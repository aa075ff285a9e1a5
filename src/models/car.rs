use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Closed set of car availability states, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CarStatus {
    Available,
    Rented,
    Inspecting,
    Maintenance,
}

impl CarStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Rented => "rented",
            CarStatus::Inspecting => "inspecting",
            CarStatus::Maintenance => "maintenance",
        }
    }

    /// Transition table for direct (administrative) status changes.
    ///
    /// A rented car can never be flipped straight back to available: only
    /// the return flow releases it, after odometer/damage inspection data
    /// has been recorded. Everything else, including a same-state write,
    /// is allowed.
    pub fn admin_transition(self, next: CarStatus) -> Result<CarStatus, AppError> {
        use CarStatus::*;
        match (self, next) {
            (Rented, Available) => Err(AppError::InvalidTransition { from: self, to: next }),
            _ => Ok(next),
        }
    }

    /// Where a car lands when its booking settles: back into the fleet if
    /// it came back clean, into the workshop otherwise.
    pub fn after_return(damage_cost_cents: i64) -> CarStatus {
        if damage_cost_cents > 0 {
            CarStatus::Maintenance
        } else {
            CarStatus::Available
        }
    }
}

impl std::fmt::Display for CarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CarStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CarStatus::Available),
            "rented" => Ok(CarStatus::Rented),
            "inspecting" => Ok(CarStatus::Inspecting),
            "maintenance" => Ok(CarStatus::Maintenance),
            other => Err(AppError::Validation(format!("unknown car status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub status: CarStatus,
    pub daily_rate_cents: i64,
    pub odometer: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rented_to_available_is_rejected() {
        let err = CarStatus::Rented.admin_transition(CarStatus::Available);
        assert!(matches!(
            err,
            Err(AppError::InvalidTransition {
                from: CarStatus::Rented,
                to: CarStatus::Available
            })
        ));
    }

    #[test]
    fn rented_to_inspecting_is_allowed() {
        assert_eq!(
            CarStatus::Rented.admin_transition(CarStatus::Inspecting).unwrap(),
            CarStatus::Inspecting
        );
    }

    #[test]
    fn inspecting_to_available_is_allowed() {
        assert_eq!(
            CarStatus::Inspecting.admin_transition(CarStatus::Available).unwrap(),
            CarStatus::Available
        );
    }

    #[test]
    fn same_state_write_is_allowed() {
        assert_eq!(
            CarStatus::Available.admin_transition(CarStatus::Available).unwrap(),
            CarStatus::Available
        );
    }

    #[test]
    fn damage_routes_to_maintenance() {
        assert_eq!(CarStatus::after_return(0), CarStatus::Available);
        assert_eq!(CarStatus::after_return(500), CarStatus::Maintenance);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in ["available", "rented", "inspecting", "maintenance"] {
            let parsed: CarStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!("totaled".parse::<CarStatus>().is_err());
    }
}
