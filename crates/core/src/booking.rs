//! Flight booking details collected by the booking dialog

use serde::{Deserialize, Serialize};

use crate::insights::PredictionEntities;

/// Details of a flight booking, filled in one step at a time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub destination: Option<String>,
    pub origin: Option<String>,
    /// Travel date as a timex expression, possibly partial (e.g. `XXXX-03-22`)
    pub travel_date: Option<String>,
    /// Cities the user mentioned that have no matching airport
    #[serde(default)]
    pub unsupported_airports: Vec<String>,
}

impl BookingDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill from the entities recognised in the booking request
    ///
    /// Cities without a canonical airport are recorded as unsupported
    /// instead of being used as destination or origin.
    pub fn from_entities(entities: &PredictionEntities) -> Self {
        let mut details = Self::default();

        if let Some(from) = &entities.from {
            match &from.airport {
                Some(airport) => details.origin = Some(airport.clone()),
                None => details.unsupported_airports.push(capitalize(&from.text)),
            }
        }

        if let Some(to) = &entities.to {
            match &to.airport {
                Some(airport) => details.destination = Some(airport.clone()),
                None => details.unsupported_airports.push(capitalize(&to.text)),
            }
        }

        details.travel_date = entities.travel_date.clone();
        details
    }

    /// All three fields are present
    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.origin.is_some() && self.travel_date.is_some()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::CityEntity;

    #[test]
    fn test_from_entities_splits_unsupported_cities() {
        let entities = PredictionEntities {
            from: Some(CityEntity {
                text: "tokyo".to_string(),
                airport: None,
            }),
            to: Some(CityEntity {
                text: "paris".to_string(),
                airport: Some("Paris".to_string()),
            }),
            travel_date: Some("XXXX-03-22".to_string()),
        };

        let details = BookingDetails::from_entities(&entities);
        assert_eq!(details.destination.as_deref(), Some("Paris"));
        assert_eq!(details.origin, None);
        assert_eq!(details.unsupported_airports, vec!["Tokyo".to_string()]);
        assert_eq!(details.travel_date.as_deref(), Some("XXXX-03-22"));
        assert!(!details.is_complete());
    }

    #[test]
    fn test_empty_details() {
        let details = BookingDetails::new();
        assert!(!details.is_complete());
        assert!(details.unsupported_airports.is_empty());
    }
}
