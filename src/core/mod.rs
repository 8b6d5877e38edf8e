pub mod sample;
pub mod track;
pub mod attitude;

pub use sample::{GeoPos, Lerp, Sample, TrackValue};
pub use track::Track;
pub use attitude::{Attitude, interp_heading_deg, normalize_deg, wrap_signed_deg};
