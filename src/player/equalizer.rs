use serde::{Deserialize, Serialize};

use super::SessionError;

pub const BAND_COUNT: usize = 10;
pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;
pub const GAIN_STEP_DB: f32 = 0.5;

/// Centre frequency of each band in Hz.
pub const BAND_FREQUENCIES: [u32; BAND_COUNT] =
    [32, 64, 125, 250, 500, 1_000, 2_000, 4_000, 8_000, 16_000];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    gains: [f32; BAND_COUNT],
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            gains: [0.0; BAND_COUNT],
        }
    }
}

fn snap(gain: f32) -> f32 {
    let clamped = gain.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
    (clamped / GAIN_STEP_DB).round() * GAIN_STEP_DB
}

/// "1kHz", "125Hz"
pub fn band_label(frequency: u32) -> String {
    if frequency >= 1_000 {
        format!("{}kHz", frequency / 1_000)
    } else {
        format!("{}Hz", frequency)
    }
}

impl EqualizerSettings {
    /// Load stored gains, snapping each to the slider grid.
    pub fn from_gains(gains: &[f32]) -> Result<Self, SessionError> {
        if gains.len() != BAND_COUNT {
            return Err(SessionError::InvalidBand(gains.len()));
        }
        let mut settings = Self::default();
        for (band, gain) in gains.iter().enumerate() {
            settings.set_gain(band, *gain)?;
        }
        Ok(settings)
    }

    pub fn gains(&self) -> &[f32; BAND_COUNT] {
        &self.gains
    }

    pub fn gain(&self, band: usize) -> Option<f32> {
        self.gains.get(band).copied()
    }

    /// Set one band and return the gain actually stored.
    pub fn set_gain(&mut self, band: usize, gain: f32) -> Result<f32, SessionError> {
        if !gain.is_finite() {
            return Err(SessionError::InvalidGain(gain));
        }
        let slot = self
            .gains
            .get_mut(band)
            .ok_or(SessionError::InvalidBand(band))?;
        *slot = snap(gain);
        Ok(*slot)
    }

    pub fn reset(&mut self) {
        self.gains = [0.0; BAND_COUNT];
    }

    pub fn is_flat(&self) -> bool {
        self.gains.iter().all(|g| *g == 0.0)
    }

    pub fn bands(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        BAND_FREQUENCIES.iter().copied().zip(self.gains.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_clamped_and_snapped() {
        let mut eq = EqualizerSettings::default();
        assert_eq!(eq.set_gain(0, 20.0).unwrap(), 12.0);
        assert_eq!(eq.set_gain(1, -30.0).unwrap(), -12.0);
        assert_eq!(eq.set_gain(2, 3.3).unwrap(), 3.5);
        assert_eq!(eq.set_gain(3, -0.2).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_band() {
        let mut eq = EqualizerSettings::default();
        assert!(matches!(eq.set_gain(BAND_COUNT, 1.0), Err(SessionError::InvalidBand(10))));
        assert!(matches!(eq.set_gain(0, f32::NAN), Err(SessionError::InvalidGain(_))));
    }

    #[test]
    fn test_reset() {
        let mut eq = EqualizerSettings::from_gains(&[1.0; BAND_COUNT]).unwrap();
        assert!(!eq.is_flat());
        eq.reset();
        assert!(eq.is_flat());
    }

    #[test]
    fn test_band_labels() {
        let labels: Vec<String> = EqualizerSettings::default()
            .bands()
            .map(|(hz, _)| band_label(hz))
            .collect();
        assert_eq!(labels.first().map(String::as_str), Some("32Hz"));
        assert_eq!(labels.last().map(String::as_str), Some("16kHz"));
        assert!(EqualizerSettings::from_gains(&[0.0; 3]).is_err());
    }
}
