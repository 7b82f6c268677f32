pub mod instances;
pub mod snapshots;
pub mod volumes;
