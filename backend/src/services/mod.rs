//! Business logic services for the Farm Parcel Management Platform

pub mod parcel;
pub mod placement;
pub mod sub_parcel;

pub use parcel::ParcelService;
pub use placement::PlacementService;
pub use sub_parcel::SubParcelService;
