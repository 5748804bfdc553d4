pub mod atomic;
pub mod state;

pub use atomic::{write_json, write_text};
pub use state::{ImportFileState, ImportState};
