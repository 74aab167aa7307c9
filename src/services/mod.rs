// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod exporter;
pub mod google_places_client;
pub mod pipeline;
pub mod retry;

pub use exporter::*;
pub use google_places_client::*;
pub use pipeline::*;
pub use retry::*;
