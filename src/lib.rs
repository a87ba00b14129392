//! Helium API client library.
//!
//! A Rust library for the Helium JSONAPI REST service. Resource types
//! (sensors, labels, elements, the authorized organization and user,
//! configurations) are thin declarations over a generic engine: the
//! [`Resource`] trait provides CRUD and include-resolution, the
//! [`ToOne`]/[`ToMany`] descriptors provide typed relationship traversal
//! and mutation, and [`Timeseries`] pages lazily through time-ordered
//! readings with a live streaming variant.
//!
//! # Quick Start
//!
//! ```no_run
//! use helium_api::{Session, Resource, Sensor, Label, HasTimeseries, TimeseriesOptions};
//!
//! #[tokio::main]
//! async fn main() -> helium_api::Result<()> {
//!     // Create a session from environment variables
//!     let session = Session::from_env()?;
//!
//!     // List all sensors for the authorized API key
//!     for sensor in session.sensors().await? {
//!         println!("{}: {}", sensor.id().unwrap_or("-"), sensor.name().unwrap_or("-"));
//!     }
//!
//!     // Fetch a label and traverse to its sensors
//!     let label = session.label("86a5c5cc-ee97-4f21-8a55-a2fd2f6914a1").await?;
//!     let sensors = label.sensors().await?;
//!     println!("{} sensors", sensors.len());
//!
//!     // Page through a sensor's readings, newest first
//!     let sensor = &sensors[0];
//!     let mut timeseries = sensor.timeseries(TimeseriesOptions::default())?;
//!     while let Some(point) = timeseries.next().await? {
//!         println!("{:?} on {}", point.value()?, point.port()?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Session`] pairs a transport [`Adapter`] with a base URL; every
//!   network call in the library goes through it.
//! - [`Resource`] turns a per-type declaration (kind, path, wrap/unwrap)
//!   into `find`/`all`/`where_metadata`/`create`/`update`/`delete`/
//!   `singleton`.
//! - [`ToOne`]/[`ToMany`] descriptors declare relationships with a fetch
//!   strategy ([`RelationType::Direct`] sub-resource URLs or
//!   [`RelationType::Include`] compound documents) and optional mutation.
//! - [`Timeseries`] is a pull-based cursor over continuation links;
//!   [`LiveStream`] is the server-push variant.
//!
//! # Configuration
//!
//! [`Session::from_env`] reads:
//!
//! - `HELIUM_API_KEY` (required) - Your Helium API key
//! - `HELIUM_API_URL` (optional) - Base URL (defaults to `https://api.helium.com/v1`)

mod adapter;
mod error;
mod jsonapi;
mod live;
mod models;
mod relations;
mod resource;
mod session;
mod timeseries;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use adapter::{Adapter, ApiResponse, ByteStream, HttpAdapter};
pub use error::{ApiErrorEntry, ApiErrors, Error, Result};
pub use session::Session;

// Re-export the resource engine
pub use relations::{RelationType, ToMany, ToOne};
pub use resource::{Attributes, Meta, Related, Resource, ResourceObject};

// Re-export the wire format
pub use jsonapi::{
    include_query, metadata_filter_query, relationship_many, relationship_one, resource_body,
    Document, Links, PrimaryData, Relationship, RelationshipData, ResourceData,
    ResourceIdentifier,
};

// Re-export timeseries types
pub use live::LiveStream;
pub use timeseries::{
    Aggregate, DataPoint, Direction, HasTimeseries, PointValue, Timeseries, TimeseriesOptions,
};

// Re-export models
pub use models::{
    Configurable, Configuration, Device, DeviceConfiguration, Element, HasMetadata, Label,
    Metadata, Organization, Sensor, User,
};
