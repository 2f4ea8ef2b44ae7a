pub mod errors;
pub mod db;
pub mod validation;
pub mod role;

pub mod company;
pub mod branch;
pub mod personnel;
pub mod admin;
pub mod customer;
pub mod service;
pub mod system_setting;

pub mod brand;
pub mod device_model;
pub mod device;
pub mod complaint;
pub mod operation;

pub use role::Role;

#[cfg(test)]
mod tests;
