// ── Domain model ──
//
// Immutable equipment snapshots, rebuilt wholesale on every fetch.
// Stale snapshots are discarded, never patched.

pub mod batch;
pub mod equipment;
pub mod id;

pub use batch::{BatchInfo, BatchInfoUpdate, FermentationType};
pub use equipment::{
    Equipment, EquipmentKind, Ferminator, FerminatorMode, FerminatorStatus, Tilt, TiltColor,
};
pub use id::EquipmentId;
