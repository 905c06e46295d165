//! Partner-facing descriptors and operation catalog.
//!
//! `descriptor` exposes validated metadata (`PartnerDescriptor`) covering the token and
//! operation endpoints, the `b2b_credentials` client credentials, per-operation success
//! codes, and outbound timeouts. `operation` names the three partner operations together
//! with their URL paths.

pub mod descriptor;
pub mod operation;

pub use descriptor::*;
pub use operation::*;
