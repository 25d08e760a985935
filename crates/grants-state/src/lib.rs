//! Grants State - journey answers and their backend projection
//!
//! Holds the pieces of the application that carry no I/O:
//! - [`FormState`]: answers accumulated while a user moves through a form
//! - [`GasPayload`]: the flattened submission shape the Grant Application
//!   Service accepts
//! - [`state_to_gas_payload`]: the pure mapping between the two
//! - [`VisitedSections`]: the bounded record of sections a user has seen
//!
//! # Example
//!
//! ```rust
//! use grants_state::{state_to_gas_payload, FormState};
//! use serde_json::json;
//!
//! let state = FormState::from_value(json!({
//!     "sbi": "106284736",
//!     "landParcel": "SX0679-9238",
//!     "actionsObj": { "CMOR1": { "value": "4.5", "unit": "ha" } }
//! }))
//! .unwrap();
//!
//! let payload = state_to_gas_payload(&state);
//! assert_eq!(payload.action_applications.unwrap().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod mapper;
mod payload;
mod state;
mod visited;

pub use mapper::{parse_quantity, split_land_parcel, state_to_gas_payload};
pub use payload::{ActionApplication, AppliedFor, GasPayload};
pub use state::{keys, FormState, StateError};
pub use visited::{update_visited_sections, VisitedSections, MAX_VISITED_SECTIONS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
