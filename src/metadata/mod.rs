//! Beam geometry for published frames.
//!
//! Metadata is sampled once per publish, never per poll. The incident
//! energy is converted to a wavelength here, and an energy that cannot be
//! converted is an error rather than an infinite header value.

mod detector;
mod provider;

pub use detector::DetectorMetadata;
pub use provider::{
    AcquisitionMetadata, Attribute, MetadataError, MetadataProvider, StaticMetadata,
    ENERGY_TO_WAVELENGTH,
};
