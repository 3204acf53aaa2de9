//! # Geohash Encoding and Proximity Validation
//!
//! The canonical geohash algorithm: base-32 alphabet
//! `0123456789bcdefghjkmnpqrstuvwxyz`, 5 bits per character, bits
//! alternating between longitude and latitude starting with longitude.
//! Decoding returns the midpoint of the encoded cell. Encoder and
//! decoder share one bit layout — a hash produced here always decodes
//! back into its own cell.
//!
//! Distance is great-circle (haversine) over the mean earth radius.
//! At the default precision of 9 characters a cell is ~4.8 m across,
//! so midpoint error is negligible against the 100 m arrival tolerance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use labops_core::Coordinates;

/// The geohash base-32 alphabet (note: no `a`, `i`, `l`, `o`).
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Mean earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Default geohash precision for custody locations.
pub const DEFAULT_GEOHASH_PRECISION: usize = 9;

/// Design constant: how far from a clinic's registered coordinates an
/// arrival may be recorded before it is flagged.
pub const DEFAULT_ARRIVAL_TOLERANCE_METERS: f64 = 100.0;

/// Errors produced by geohash decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// The hash contains a character outside the base-32 alphabet.
    #[error("invalid geohash character {ch:?} in {hash:?}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// The full hash as received.
        hash: String,
    },

    /// The hash is empty.
    #[error("empty geohash")]
    Empty,
}

/// Encode coordinates into a geohash of the given precision.
pub fn encode(coords: Coordinates, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut bit = 0u8;
    let mut ch_index = 0usize;
    let mut even_bit = true; // longitude first

    while hash.len() < precision {
        if even_bit {
            let mid = (lng_range.0 + lng_range.1) / 2.0;
            if coords.lng >= mid {
                ch_index = (ch_index << 1) | 1;
                lng_range.0 = mid;
            } else {
                ch_index <<= 1;
                lng_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if coords.lat >= mid {
                ch_index = (ch_index << 1) | 1;
                lat_range.0 = mid;
            } else {
                ch_index <<= 1;
                lat_range.1 = mid;
            }
        }
        even_bit = !even_bit;
        bit += 1;
        if bit == 5 {
            hash.push(BASE32[ch_index] as char);
            bit = 0;
            ch_index = 0;
        }
    }
    hash
}

/// Decode a geohash to the midpoint of its cell.
pub fn decode(hash: &str) -> Result<Coordinates, GeoError> {
    if hash.is_empty() {
        return Err(GeoError::Empty);
    }

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut even_bit = true;

    for ch in hash.chars() {
        let index = BASE32
            .iter()
            .position(|b| *b as char == ch.to_ascii_lowercase())
            .ok_or_else(|| GeoError::InvalidCharacter {
                ch,
                hash: hash.to_string(),
            })?;
        for shift in (0..5).rev() {
            let bit = (index >> shift) & 1;
            if even_bit {
                let mid = (lng_range.0 + lng_range.1) / 2.0;
                if bit == 1 {
                    lng_range.0 = mid;
                } else {
                    lng_range.1 = mid;
                }
            } else {
                let mid = (lat_range.0 + lat_range.1) / 2.0;
                if bit == 1 {
                    lat_range.0 = mid;
                } else {
                    lat_range.1 = mid;
                }
            }
            even_bit = !even_bit;
        }
    }

    Ok(Coordinates {
        lat: (lat_range.0 + lat_range.1) / 2.0,
        lng: (lng_range.0 + lng_range.1) / 2.0,
    })
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Result of a proximity check between two geohashes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCheck {
    /// Whether the distance is within tolerance.
    pub valid: bool,
    /// Measured great-circle distance in meters.
    pub distance_meters: f64,
}

/// Check whether two geohashes decode to points within `tolerance_meters`
/// of each other.
///
/// Symmetric in its two hash arguments, and monotonic in tolerance:
/// raising the tolerance never turns a valid result invalid.
pub fn within_tolerance(
    point: &str,
    reference: &str,
    tolerance_meters: f64,
) -> Result<GeoCheck, GeoError> {
    let a = decode(point)?;
    let b = decode(reference)?;
    let distance_meters = haversine_km(a, b) * 1000.0;
    Ok(GeoCheck {
        valid: distance_meters <= tolerance_meters,
        distance_meters,
    })
}
