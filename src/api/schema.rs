//! JSON schemas for the track platform's REST API.
//!
//! Field names follow the backend's camelCase wire format. All records are
//! plain data: the client never mutates them after deserialization.

use serde::{Deserialize, Serialize};

/// The `{code, message, data}` envelope wrapping every response body.
///
/// This layer does not interpret `code`; callers decide what counts as
/// success (the backend uses 200 for success and 400/500 for failures).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    /// Application-level status code, independent of the HTTP status.
    pub code: i32,
    /// Human-readable outcome description. Some endpoints omit it.
    #[serde(default)]
    pub message: Option<String>,
    /// The actual payload.
    pub data: T,
}

/// A single timestamped location sample.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    /// Identifier of this point, absent for points not yet persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identifier of the account owning this point.
    pub account_id: String,
    /// Latitude in degrees, within [-90, 90] (guaranteed by the server).
    pub latitude: f64,
    /// Longitude in degrees, within [-180, 180] (guaranteed by the server).
    pub longitude: f64,
    /// ISO-8601 timestamp of the sample.
    pub timestamp: String,
    /// Horizontal accuracy estimate in meters, if the device reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Instantaneous speed in meters per second, if the device reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// A named, chronologically ordered track belonging to one account.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    /// Unique identifier of the track.
    pub id: String,
    /// Display name of the track.
    pub name: String,
    /// Identifier of the account owning this track.
    pub account_id: String,
    /// The points of the track, in chronological order. Track listing
    /// endpoints may return this empty, with points available separately
    /// under `/tracks/{id}/points`.
    #[serde(default)]
    pub points: Vec<TrackPoint>,
    /// ISO-8601 timestamp of the first point.
    pub start_time: String,
    /// ISO-8601 timestamp of the last point.
    pub end_time: String,
    /// Total number of points in the track. Expected to equal `points.len()`
    /// when the points are inlined; not checked here.
    pub total_points: u32,
}

/// A user account known to the platform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier of the user.
    pub id: String,
    /// Display name of the user.
    pub name: String,
    /// Identifier of the campus this user belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus_id: Option<String>,
}

/// A campus of the platform.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    /// Unique identifier of the campus.
    pub id: String,
    /// Display name of the campus.
    pub name: String,
    /// Latitude of the campus center in degrees, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude of the campus center in degrees, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}
