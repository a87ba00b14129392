//! Concrete Helium resource types.
//!
//! Each module declares one resource: its kind, its typed attribute
//! accessors, and its relationship descriptors wired through the generic
//! builders in `crate::relations`.

mod configuration;
mod device;
mod device_configuration;
mod element;
mod label;
mod metadata;
mod organization;
mod sensor;
mod user;

pub use configuration::Configuration;
pub use device::{Configurable, Device};
pub use device_configuration::DeviceConfiguration;
pub use element::Element;
pub use label::Label;
pub use metadata::{HasMetadata, Metadata};
pub use organization::Organization;
pub use sensor::Sensor;
pub use user::User;
