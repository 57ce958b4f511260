//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use std::str::FromStr;
use utoipa::ToSchema;

/// Store a string-coded enum as TEXT through its `as_str` / `FromStr` pair
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}
pub(crate) use text_column;

// ---------------------------------------------------------------------------
// VehicleType
// ---------------------------------------------------------------------------

/// Vehicle category, which decides the plate fields a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum VehicleType {
    #[serde(rename = "3/4")]
    ThreeQuarter,
    #[serde(rename = "TOCO")]
    Toco,
    #[serde(rename = "TRUCK")]
    Truck,
    /// Tractor unit with a separate box trailer
    #[serde(rename = "BODYWORK", alias = "CARROCERIA")]
    Bodywork,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::ThreeQuarter => "3/4",
            VehicleType::Toco => "TOCO",
            VehicleType::Truck => "TRUCK",
            VehicleType::Bodywork => "BODYWORK",
        }
    }

    pub fn is_bodywork(&self) -> bool {
        matches!(self, VehicleType::Bodywork)
    }
}

impl Default for VehicleType {
    fn default() -> Self {
        VehicleType::ThreeQuarter
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3/4" => Ok(VehicleType::ThreeQuarter),
            "TOCO" => Ok(VehicleType::Toco),
            "TRUCK" => Ok(VehicleType::Truck),
            "BODYWORK" | "CARROCERIA" => Ok(VehicleType::Bodywork),
            other => Err(format!("Unknown vehicle type: {}", other)),
        }
    }
}

text_column!(VehicleType);

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProgressStatus
// ---------------------------------------------------------------------------

/// Progress stage of a loading record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Queued,
    Docked,
    Loading,
    Finished,
    Released,
}

impl ProgressStatus {
    pub const ALL: [ProgressStatus; 5] = [
        ProgressStatus::Queued,
        ProgressStatus::Docked,
        ProgressStatus::Loading,
        ProgressStatus::Finished,
        ProgressStatus::Released,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Queued => "queued",
            ProgressStatus::Docked => "docked",
            ProgressStatus::Loading => "loading",
            ProgressStatus::Finished => "finished",
            ProgressStatus::Released => "released",
        }
    }

    /// Fixed percentage of the stage
    pub fn percentage(&self) -> u8 {
        match self {
            ProgressStatus::Queued => 0,
            ProgressStatus::Docked => 25,
            ProgressStatus::Loading => 50,
            ProgressStatus::Finished => 75,
            ProgressStatus::Released => 100,
        }
    }

    /// History description used when a record reaches this stage
    pub fn description(&self) -> &'static str {
        match self {
            ProgressStatus::Queued => "Loading registered in queue",
            ProgressStatus::Docked => "Vehicle docked",
            ProgressStatus::Loading => "Loading started",
            ProgressStatus::Finished => "Loading finished",
            ProgressStatus::Released => "Vehicle released",
        }
    }
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgressStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown progress status: {}", s))
    }
}

text_column!(ProgressStatus);

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LifecycleStatus
// ---------------------------------------------------------------------------

/// Coarse record status used for dock occupancy and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Pending,
    /// Vehicle holds its dock
    #[serde(alias = "in_progress")]
    InUse,
    Completed,
    Cancelled,
    Released,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::InUse => "in_use",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Cancelled => "cancelled",
            LifecycleStatus::Released => "released",
        }
    }

    /// The vehicle has left its dock
    pub fn is_released(&self) -> bool {
        matches!(self, LifecycleStatus::Released | LifecycleStatus::Completed)
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LifecycleStatus::Pending),
            "in_use" | "in_progress" => Ok(LifecycleStatus::InUse),
            "completed" => Ok(LifecycleStatus::Completed),
            "cancelled" => Ok(LifecycleStatus::Cancelled),
            "released" => Ok(LifecycleStatus::Released),
            other => Err(format!("Unknown lifecycle status: {}", other)),
        }
    }
}

text_column!(LifecycleStatus);

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_wire_names() {
        assert_eq!(serde_json::to_string(&VehicleType::ThreeQuarter).unwrap(), "\"3/4\"");
        let legacy: VehicleType = serde_json::from_str("\"CARROCERIA\"").unwrap();
        assert_eq!(legacy, VehicleType::Bodywork);
    }

    #[test]
    fn test_lifecycle_in_progress_alias() {
        let status: LifecycleStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, LifecycleStatus::InUse);
        assert_eq!("in_progress".parse::<LifecycleStatus>(), Ok(LifecycleStatus::InUse));
    }

    #[test]
    fn test_progress_status_round_trips_through_str() {
        for status in ProgressStatus::ALL {
            assert_eq!(status.as_str().parse::<ProgressStatus>(), Ok(status));
        }
        assert!("done".parse::<ProgressStatus>().is_err());
    }
}
