//! Assets module - asset records, escrow state, and the collaborator traits
//! that supply them.

mod assets_model;
mod assets_traits;

pub use assets_model::{AssetRecord, EscrowState};
pub use assets_traits::{AssetDirectoryTrait, EscrowSourceTrait, LedgerSourceTrait};
