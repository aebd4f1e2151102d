//! Acquisition metadata and the provider abstraction.

use thiserror::Error;

use crate::acquisition::TransportError;

/// Photon energy (eV) to wavelength (Å) conversion constant.
pub const ENERGY_TO_WAVELENGTH: f64 = 12400.0;

/// Errors raised while sampling acquisition metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read attribute {attribute}: {source}")]
    Read {
        attribute: Attribute,
        #[source]
        source: TransportError,
    },
    #[error("attribute {attribute} has malformed value: {reason}")]
    Malformed { attribute: Attribute, reason: String },
    #[error("attribute {attribute} is not finite ({value})")]
    NonFinite { attribute: Attribute, value: f64 },
    #[error("incident energy {0} eV cannot be converted to a wavelength")]
    InvalidEnergy(f64),
}

/// The four scalar attributes sampled at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    BeamCenterX,
    BeamCenterY,
    DetectorDistance,
    IncidentEnergy,
}

impl Attribute {
    /// All attributes, in read order.
    pub const ALL: [Attribute; 4] = [
        Attribute::BeamCenterX,
        Attribute::BeamCenterY,
        Attribute::DetectorDistance,
        Attribute::IncidentEnergy,
    ];

    /// Device attribute name.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::BeamCenterX => "BeamCenterX",
            Attribute::BeamCenterY => "BeamCenterY",
            Attribute::DetectorDistance => "DetectorDistance",
            Attribute::IncidentEnergy => "IncidentEnergy",
        }
    }

    /// Detector configuration parameter holding this attribute.
    pub fn config_key(self) -> &'static str {
        match self {
            Attribute::BeamCenterX => "beam_center_x",
            Attribute::BeamCenterY => "beam_center_y",
            Attribute::DetectorDistance => "detector_distance",
            Attribute::IncidentEnergy => "incident_energy",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Beam geometry for one publish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionMetadata {
    /// Beam center X in pixels.
    pub beam_center_x: f64,
    /// Beam center Y in pixels.
    pub beam_center_y: f64,
    /// Sample to detector distance in meters.
    pub detector_distance: f64,
    /// Incident photon energy in eV.
    pub incident_energy: f64,
}

impl AcquisitionMetadata {
    /// Builds metadata from raw attribute values, rejecting values that
    /// would corrupt the header.
    pub fn new(
        beam_center_x: f64,
        beam_center_y: f64,
        detector_distance: f64,
        incident_energy: f64,
    ) -> Result<Self, MetadataError> {
        let metadata = Self {
            beam_center_x,
            beam_center_y,
            detector_distance,
            incident_energy,
        };
        metadata.validate()?;
        Ok(metadata)
    }

    /// Checks that every value is finite and the energy is positive.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for attribute in Attribute::ALL {
            let value = self.get(attribute);
            if !value.is_finite() {
                return Err(MetadataError::NonFinite { attribute, value });
            }
        }
        if self.incident_energy <= 0.0 {
            return Err(MetadataError::InvalidEnergy(self.incident_energy));
        }
        Ok(())
    }

    /// Returns the value of one attribute.
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::BeamCenterX => self.beam_center_x,
            Attribute::BeamCenterY => self.beam_center_y,
            Attribute::DetectorDistance => self.detector_distance,
            Attribute::IncidentEnergy => self.incident_energy,
        }
    }

    /// Incident wavelength in Å.
    pub fn wavelength(&self) -> Result<f64, MetadataError> {
        if !self.incident_energy.is_finite() || self.incident_energy <= 0.0 {
            return Err(MetadataError::InvalidEnergy(self.incident_energy));
        }
        Ok(ENERGY_TO_WAVELENGTH / self.incident_energy)
    }
}

/// Source of beam geometry.
///
/// Implementations read individual attributes; [`MetadataProvider::sample`]
/// reads all four and fails on the first error.
pub trait MetadataProvider {
    /// Reads one scalar attribute.
    fn read_attribute(&mut self, attribute: Attribute) -> Result<f64, MetadataError>;

    /// Samples all attributes for one publish decision.
    fn sample(&mut self) -> Result<AcquisitionMetadata, MetadataError> {
        let beam_center_x = self.read_attribute(Attribute::BeamCenterX)?;
        let beam_center_y = self.read_attribute(Attribute::BeamCenterY)?;
        let detector_distance = self.read_attribute(Attribute::DetectorDistance)?;
        let incident_energy = self.read_attribute(Attribute::IncidentEnergy)?;
        AcquisitionMetadata::new(
            beam_center_x,
            beam_center_y,
            detector_distance,
            incident_energy,
        )
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Box<P> {
    fn read_attribute(&mut self, attribute: Attribute) -> Result<f64, MetadataError> {
        (**self).read_attribute(attribute)
    }

    fn sample(&mut self) -> Result<AcquisitionMetadata, MetadataError> {
        (**self).sample()
    }
}

/// Provider returning fixed values.
#[derive(Debug, Clone, Copy)]
pub struct StaticMetadata {
    values: AcquisitionMetadata,
}

impl StaticMetadata {
    pub fn new(values: AcquisitionMetadata) -> Self {
        Self { values }
    }
}

impl From<&crate::acquisition::MetadataConfig> for StaticMetadata {
    fn from(config: &crate::acquisition::MetadataConfig) -> Self {
        Self::new(AcquisitionMetadata {
            beam_center_x: config.beam_center_x,
            beam_center_y: config.beam_center_y,
            detector_distance: config.detector_distance,
            incident_energy: config.incident_energy,
        })
    }
}

impl MetadataProvider for StaticMetadata {
    fn read_attribute(&mut self, attribute: Attribute) -> Result<f64, MetadataError> {
        Ok(self.values.get(attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(energy: f64) -> AcquisitionMetadata {
        AcquisitionMetadata {
            beam_center_x: 2070.0,
            beam_center_y: 2190.0,
            detector_distance: 0.15,
            incident_energy: energy,
        }
    }

    #[test]
    fn test_wavelength_from_energy() {
        assert_eq!(metadata(12400.0).wavelength().unwrap(), 1.0);
        assert_eq!(metadata(6200.0).wavelength().unwrap(), 2.0);
    }

    #[test]
    fn test_zero_energy_rejected() {
        assert!(matches!(
            metadata(0.0).wavelength(),
            Err(MetadataError::InvalidEnergy(_))
        ));
        assert!(matches!(
            AcquisitionMetadata::new(1.0, 1.0, 0.1, 0.0),
            Err(MetadataError::InvalidEnergy(_))
        ));
    }

    #[test]
    fn test_negative_energy_rejected() {
        assert!(metadata(-12400.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_attribute_rejected() {
        assert!(matches!(
            AcquisitionMetadata::new(f64::NAN, 1.0, 0.1, 12400.0),
            Err(MetadataError::NonFinite {
                attribute: Attribute::BeamCenterX,
                ..
            })
        ));
    }

    #[test]
    fn test_static_provider_samples_config() {
        let mut provider = StaticMetadata::new(metadata(12400.0));
        let sampled = provider.sample().unwrap();

        assert_eq!(sampled, metadata(12400.0));
    }

    #[test]
    fn test_static_provider_with_zero_energy_fails() {
        let mut provider = StaticMetadata::new(metadata(0.0));
        assert!(matches!(
            provider.sample(),
            Err(MetadataError::InvalidEnergy(_))
        ));
    }

    #[test]
    fn test_boxed_provider_delegates() {
        let mut provider: Box<dyn MetadataProvider> =
            Box::new(StaticMetadata::new(metadata(6200.0)));
        assert_eq!(provider.read_attribute(Attribute::DetectorDistance).unwrap(), 0.15);
        assert_eq!(provider.sample().unwrap().wavelength().unwrap(), 2.0);
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(Attribute::IncidentEnergy.to_string(), "IncidentEnergy");
        assert_eq!(Attribute::BeamCenterY.config_key(), "beam_center_y");
    }
}
