// brewcreator-core: Typed domain layer between brewcreator-api and consumers.
//
// Raw fleet records become immutable, kind-tagged equipment snapshots;
// the `BrewCreator` facade bundles fleet reads, device writes, and the
// realtime session behind one handle.

pub mod config;
pub mod convert;
pub mod directory;
pub mod error;
pub mod hub;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AccountCredentials, BrewCreatorConfig};
pub use directory::EquipmentDirectory;
pub use error::CoreError;
pub use hub::BrewCreator;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BatchInfo, BatchInfoUpdate, Equipment, EquipmentId, EquipmentKind, FermentationType,
    Ferminator, FerminatorMode, FerminatorStatus, Tilt, TiltColor,
};

// The token-store contract travels with the core API surface.
pub use brewcreator_api::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};
