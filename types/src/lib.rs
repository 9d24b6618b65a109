//! Core domain types for Dozen - no IO, no async.
//!
//! - **`radix`**: the base-12 numeral codec and the [`Dozenal`] newtype
//! - **`settings`**: validated configuration shared by the loader and the core
//! - **`band`**: classification thresholds for the derived scalar

pub mod band;
pub mod radix;
pub mod settings;

pub use band::{SignalBand, Thresholds, ThresholdsError};
pub use radix::{Dozenal, RadixError, decode, encode, encode_f64};
pub use settings::{
    DriverSettings, Protocol, Settings, SettingsError, StabilizerSettings,
    StabilizerSettingsBuilder, StateSettings,
};
