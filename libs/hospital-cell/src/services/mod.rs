pub mod hospital;
pub mod location;

pub use hospital::HospitalService;
pub use location::LocationService;
