//! Domain definitions.

pub mod customer;
pub mod employee;
pub mod income;
pub mod sale;
pub mod vehicle;

pub use self::{
    customer::Customer, employee::Employee, income::Income, sale::Sale,
    vehicle::Vehicle,
};
