//! Campus dining locations where a fairy can meet a requestor.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A valid Flexi Fairy meeting location.
///
/// Clients send the display name; anything outside this list is rejected
/// with [`EngineError::InvalidLocation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "Lone Mountain")]
    LoneMountain,
    #[serde(rename = "Market Cafe")]
    MarketCafe,
    #[serde(rename = "Wolf & Kettle")]
    WolfAndKettle,
    #[serde(rename = "Crossroads Cafe")]
    CrossroadsCafe,
    #[serde(rename = "Koret Health Center")]
    KoretHealthCenter,
}

impl Location {
    pub const ALL: [Location; 5] = [
        Self::LoneMountain,
        Self::MarketCafe,
        Self::WolfAndKettle,
        Self::CrossroadsCafe,
        Self::KoretHealthCenter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoneMountain => "Lone Mountain",
            Self::MarketCafe => "Market Cafe",
            Self::WolfAndKettle => "Wolf & Kettle",
            Self::CrossroadsCafe => "Crossroads Cafe",
            Self::KoretHealthCenter => "Koret Health Center",
        }
    }
}

impl TryFrom<&str> for Location {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|location| location.as_str() == trimmed)
            .ok_or_else(|| EngineError::InvalidLocation(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_names() {
        assert_eq!(Location::try_from("Market Cafe"), Ok(Location::MarketCafe));
        assert_eq!(
            Location::try_from("  Wolf & Kettle "),
            Ok(Location::WolfAndKettle)
        );
    }

    #[test]
    fn rejects_unknown_locations() {
        assert_eq!(
            Location::try_from("market cafe"),
            Err(EngineError::InvalidLocation("market cafe".to_string()))
        );
        assert!(Location::try_from("").is_err());
    }

    #[test]
    fn every_location_round_trips_through_its_name() {
        for location in Location::ALL {
            assert_eq!(Location::try_from(location.as_str()), Ok(location));
        }
    }
}
