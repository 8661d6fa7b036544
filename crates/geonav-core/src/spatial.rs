//! Spatial math for route markers and geographic offsets.

use crate::models::WorldPose;

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Project a geographic point into a local world frame anchored at an origin.
///
/// World axes follow the AR convention used for markers: x = east,
/// y = up, z = north. Uses latitude-aware scaling, which is accurate for
/// the few hundred meters a walking route spans.
pub fn geo_to_world(
    lat: f64,
    lon: f64,
    height_m: f64,
    origin_lat: f64,
    origin_lon: f64,
) -> WorldPose {
    let east = (lon - origin_lon) * meters_per_deg_lon(origin_lat);
    let north = (lat - origin_lat) * meters_per_deg_lat(origin_lat);
    WorldPose::new(east, height_m, north)
}

/// Yaw (degrees, around world up) that makes an object at `from` look at `to`.
///
/// Only the horizontal component counts; 0 = facing +z, 90 = facing +x.
/// Coincident points yield 0.
pub fn look_at_yaw_deg(from: &WorldPose, to: &WorldPose) -> f64 {
    let dx = to.position[0] - from.position[0];
    let dz = to.position[2] - from.position[2];
    if dx.abs() <= f64::EPSILON && dz.abs() <= f64::EPSILON {
        return 0.0;
    }
    dx.atan2(dz).to_degrees()
}
