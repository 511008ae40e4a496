use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::PlaybackError;

/// The playback speeds the player offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackRate {
    Quarter,
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 7] = [
        PlaybackRate::Quarter,
        PlaybackRate::Half,
        PlaybackRate::ThreeQuarters,
        PlaybackRate::Normal,
        PlaybackRate::OneAndQuarter,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
    ];

    pub fn as_f64(self) -> f64 {
        match self {
            PlaybackRate::Quarter => 0.25,
            PlaybackRate::Half => 0.5,
            PlaybackRate::ThreeQuarters => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndQuarter => 1.25,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = PlaybackError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // Every allowed rate is exactly representable, so equality is safe.
        Self::ALL
            .into_iter()
            .find(|rate| rate.as_f64() == value)
            .ok_or(PlaybackError::UnsupportedRate(value))
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.as_f64())
    }
}

impl Serialize for PlaybackRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_rates_parse() {
        for rate in PlaybackRate::ALL {
            assert_eq!(PlaybackRate::try_from(rate.as_f64()), Ok(rate));
        }
    }

    #[test]
    fn other_rates_rejected() {
        for value in [0.0, 3.0, 1.1, -1.0, f64::NAN] {
            assert!(PlaybackRate::try_from(value).is_err());
        }
    }

    #[test]
    fn display() {
        assert_eq!(PlaybackRate::Normal.to_string(), "1x");
        assert_eq!(PlaybackRate::OneAndQuarter.to_string(), "1.25x");
    }
}
