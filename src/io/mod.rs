pub mod file;

pub use file::{load_records, save_records};
