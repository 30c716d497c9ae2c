pub mod cascade;
pub mod handlers;
pub mod management;
pub mod models;
pub mod router;
pub mod services;

pub use cascade::{choose_district, choose_division, load_divisions, restore_area, CascadeHost, LocationCascade};
pub use models::{AreaFilter, AreaPreference, District, Division, Hospital, HospitalForm, Upazila};
pub use services::{HospitalService, LocationService};
