//! Victim markers for the relief map.
//!
//! A victim with a saved GPS position is placed there. Everyone else is
//! placed near their district's centre, offset by a small jitter derived
//! from the victim id so markers neither stack nor move between requests.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{Account, Coordinates, Urgency, Victim, VictimNeeds, VictimProfile};
use crate::storage::{document, Storage};

/// Centre of Sri Lanka, used for unknown districts.
pub const ISLAND_CENTRE: Coordinates = Coordinates {
    latitude: 7.8731,
    longitude: 80.7718,
};

/// Largest offset from a district centre, in degrees.
pub const MAX_JITTER: f64 = 0.025;

const NO_NEEDS: &str = "Help Needed";

const DISTRICTS: &[(&str, f64, f64)] = &[
    ("Colombo", 6.9271, 79.8612),
    ("Gampaha", 7.0840, 79.9939),
    ("Kalutara", 6.5854, 79.9607),
    ("Galle", 6.0535, 80.2210),
    ("Matara", 5.9549, 80.5550),
    ("Hambantota", 6.1429, 81.1212),
    ("Kandy", 7.2906, 80.6337),
    ("Matale", 7.4675, 80.6234),
    ("Nuwara Eliya", 6.9497, 80.7891),
    ("Jaffna", 9.6615, 80.0255),
    ("Mannar", 8.9766, 79.9043),
    ("Vavuniya", 8.7542, 80.4982),
    ("Mullaitivu", 9.2671, 80.8142),
    ("Kilinochchi", 9.3803, 80.4150),
    ("Batticaloa", 7.7310, 81.6747),
    ("Ampara", 7.2817, 81.6747),
    ("Trincomalee", 8.5874, 81.2152),
    ("Kurunegala", 7.4863, 80.3647),
    ("Puttalam", 8.0408, 79.8394),
    ("Anuradhapura", 8.3114, 80.4037),
    ("Polonnaruwa", 7.9403, 81.0188),
    ("Badulla", 6.9934, 81.0550),
    ("Monaragala", 6.8714, 81.3487),
    ("Ratnapura", 6.6828, 80.3992),
    ("Kegalle", 7.2513, 80.3464),
    ("Western", 6.9271, 79.8612),
];

/// Centre of `district` (case-insensitive), or [`ISLAND_CENTRE`].
#[must_use]
pub fn district_centre(district: &str) -> Coordinates {
    let district = district.trim();
    DISTRICTS
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(district))
        .map_or(ISLAND_CENTRE, |&(_, latitude, longitude)| Coordinates {
            latitude,
            longitude,
        })
}

/// Offset in `[-MAX_JITTER, MAX_JITTER]` for each axis, fixed per id.
#[must_use]
pub fn jitter(victim_id: &str) -> (f64, f64) {
    let hash = blake3::hash(victim_id.as_bytes());
    let bytes = hash.as_bytes();
    let unit = |offset: usize| {
        let word = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        f64::from(word) / f64::from(u32::MAX)
    };
    (
        (unit(0) - 0.5) * 2.0 * MAX_JITTER,
        (unit(4) - 0.5) * 2.0 * MAX_JITTER,
    )
}

/// One marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    /// Victim id.
    pub victim_id: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Household size, the victim included.
    pub people: usize,
    /// Comma-separated requested items.
    pub needs: String,
    /// Victim's name.
    pub name: String,
    /// Contact number.
    pub phone: String,
    /// Registered district.
    pub district: String,
    /// Urgency of the need request, if one was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

fn marker(
    victim: Victim,
    profile: Option<&VictimProfile>,
    needs: Option<&VictimNeeds>,
) -> MapPoint {
    let (lat, lng) = match profile.and_then(|p| p.location) {
        Some(at) => (at.latitude, at.longitude),
        None => {
            let centre = district_centre(&victim.district);
            let (dlat, dlng) = jitter(&victim.victim_id);
            (centre.latitude + dlat, centre.longitude + dlng)
        }
    };
    let labels = needs.map(|n| n.items.labels()).unwrap_or_default();
    MapPoint {
        lat,
        lng,
        people: profile.map_or(0, |p| p.family_members.len()) + 1,
        needs: if labels.is_empty() {
            NO_NEEDS.to_string()
        } else {
            labels.join(", ")
        },
        urgency: needs.map(|n| n.urgency),
        name: victim.full_name,
        phone: profile.map_or(victim.phone, |p| p.phone.clone()),
        district: victim.district,
        victim_id: victim.victim_id,
    }
}

/// A marker for every registered victim.
///
/// # Errors
///
/// Returns a storage error.
pub fn map_points(storage: &Storage) -> Result<Vec<MapPoint>> {
    let points = storage.read(|conn| {
        let victims: Vec<Account<Victim>> = document::list_all(conn)?;
        let mut points = Vec::with_capacity(victims.len());
        for account in victims {
            let id = account.profile.victim_id.clone();
            let profile: Option<VictimProfile> = document::get(conn, &id)?;
            let needs: Option<VictimNeeds> = document::get(conn, &id)?;
            points.push(marker(account.profile, profile.as_ref(), needs.as_ref()));
        }
        Ok(points)
    })?;
    debug!(points = points.len(), "Built map data");
    Ok(points)
}
