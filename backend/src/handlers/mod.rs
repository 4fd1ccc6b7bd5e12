//! HTTP handlers for the Farm Parcel Management Platform

pub mod health;
pub mod parcel;
pub mod placement;
pub mod sub_parcel;

pub use health::health_check;
pub use parcel::{create_parcel, delete_parcel, get_parcel, list_parcels, update_parcel};
pub use placement::{
    accumulate_cost, create_placement, delete_placement, finalize_placement, get_placement,
    get_placement_history, list_placements, update_placement,
};
pub use sub_parcel::{
    create_sub_parcel, delete_sub_parcel, get_sub_parcel, list_sub_parcels, update_sub_parcel,
};
