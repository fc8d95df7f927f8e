//! Emergency alert composition

use crate::location::Coordinates;

/// First line of every alert
pub const ALERT_BANNER: &str = "🚨 SOS ALERT 🚨";

/// Map link for a position.
///
/// Coordinates keep the precision the provider gave them: `f64` display is
/// the shortest representation that round-trips.
pub fn map_link(coordinates: &Coordinates) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        coordinates.latitude, coordinates.longitude
    )
}

/// A single SOS transmission attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyAlert {
    pub recipient: String,
    pub coordinates: Coordinates,
    pub message: String,
}

impl EmergencyAlert {
    pub fn compose(recipient: impl Into<String>, coordinates: Coordinates) -> Self {
        let message = format!(
            "{}\nGoogle Maps Location: {}",
            ALERT_BANNER,
            map_link(&coordinates)
        );
        Self {
            recipient: recipient.into(),
            coordinates,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_contains_map_link() {
        let alert = EmergencyAlert::compose("+8801234567", Coordinates::new(23.8103, 90.4125));
        assert_eq!(alert.recipient, "+8801234567");
        assert!(alert
            .message
            .contains("https://www.google.com/maps?q=23.8103,90.4125"));
        assert!(alert.message.starts_with(ALERT_BANNER));
    }

    #[test]
    fn test_full_precision_and_sign() {
        let link = map_link(&Coordinates::new(-33.868820123456, 151.20929));
        assert_eq!(link, "https://www.google.com/maps?q=-33.868820123456,151.20929");
    }
}
