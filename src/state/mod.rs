pub mod selection;

pub use selection::{SelectionState, SelectionStore, SharedSelectionState};
