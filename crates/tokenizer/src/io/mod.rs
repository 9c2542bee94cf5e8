//! Artifact files: BPE models, vocabularies and the network directory.

pub mod load;
pub mod network;
pub mod save;

pub use load::{load_bpe_model, load_vocabulary};
pub use network::{NetworkDir, Side};
pub use save::{save_bpe_model, save_vocabulary};
