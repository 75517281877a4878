//! # BMV Text Protocol Module
//!
//! Implementation of the Victron BMV 600/602 text protocol.
//!
//! This module handles:
//! - Device profiles (field layouts of the BMV 600 and BMV 602)
//! - Frame detection and half-frame checksum validation
//! - Conversion of raw values to typed fields
//! - Projection of typed fields onto a `Reading`

pub mod profile;
pub mod checksum;
pub mod scanner;
pub mod encoder;
pub mod coercer;
pub mod reading;
pub mod reader;

pub use coercer::{coerce, FieldValue, TypedReading};
pub use profile::{BmvModel, DeviceProfile};
pub use reader::BmvReader;
pub use reading::Reading;
