//! File-backed storage.

pub mod atomic_json;
pub mod session_file;

pub use atomic_json::AtomicJsonFile;
pub use session_file::SessionFile;
