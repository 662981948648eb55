//! # Construction Checks
//!
//! Minimum room sizes of the substation building: the user room (U) scales
//! with the transformer rating; the distributor (C) and metering (M) rooms
//! follow the distributor's standard layout.

use serde::{Deserialize, Serialize};

use crate::errors::{require_positive, CalcResult};

/// Natural ventilation opening per m² of floor, with a 0.2 m² floor
pub const VENT_SHARE: f64 = 0.01;
pub const VENT_MIN_M2: f64 = 0.2;
/// Longest escape route (m, CEI 99-4)
pub const MAX_ESCAPE_ROUTE_M: f64 = 20.0;
pub const MIN_CORRIDOR_WIDTH_M: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub length_m: f64,
    pub depth_m: f64,
    pub height_m: f64,
}

impl RoomDimensions {
    pub fn area_m2(&self) -> f64 {
        self.length_m * self.depth_m
    }

    pub fn volume_m3(&self) -> f64 {
        self.area_m2() * self.height_m
    }

    /// Natural ventilation opening (m²)
    pub fn ventilation_m2(&self) -> f64 {
        (self.area_m2() * VENT_SHARE).max(VENT_MIN_M2)
    }
}

const DISTRIBUTOR_ROOM: RoomDimensions = RoomDimensions {
    length_m: 2.0,
    depth_m: 1.5,
    height_m: 2.2,
};

const METERING_ROOM: RoomDimensions = RoomDimensions {
    length_m: 1.5,
    depth_m: 1.2,
    height_m: 2.2,
};

/// Minimum user room for a transformer rating.
pub fn user_room(transformer_kva: u32) -> RoomDimensions {
    let (length_m, depth_m, height_m) = match transformer_kva {
        0..=400 => (4.0, 3.0, 2.5),
        401..=1000 => (5.0, 4.0, 2.5),
        _ => (6.0, 5.0, 3.0),
    };
    RoomDimensions {
        length_m,
        depth_m,
        height_m,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionInput {
    #[serde(default)]
    pub label: String,
    pub transformer_kva: u32,
}

impl ConstructionInput {
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("transformer_kva", f64::from(self.transformer_kva))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionResult {
    pub user_room: RoomDimensions,
    pub user_room_area_m2: f64,
    pub user_room_volume_m3: f64,
    pub distributor_room: RoomDimensions,
    pub metering_room: RoomDimensions,
    pub distributor_ventilation_m2: f64,
    pub metering_ventilation_m2: f64,
    pub max_escape_route_m: f64,
    pub min_corridor_width_m: f64,
}

pub fn calculate(input: &ConstructionInput) -> CalcResult<ConstructionResult> {
    input.validate()?;
    let user = user_room(input.transformer_kva);
    Ok(ConstructionResult {
        user_room: user,
        user_room_area_m2: user.area_m2(),
        user_room_volume_m3: user.volume_m3(),
        distributor_room: DISTRIBUTOR_ROOM,
        metering_room: METERING_ROOM,
        distributor_ventilation_m2: DISTRIBUTOR_ROOM.ventilation_m2(),
        metering_ventilation_m2: METERING_ROOM.ventilation_m2(),
        max_escape_route_m: MAX_ESCAPE_ROUTE_M,
        min_corridor_width_m: MIN_CORRIDOR_WIDTH_M,
    })
}
