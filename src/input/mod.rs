pub mod csv;
pub mod loader;

pub use csv::{load_attitude_csv, load_availability_csv, load_instrument_csv, load_position_csv};
pub use loader::{read_file_bytes, LoadError, LoadOutcome, OneShotLoader};
