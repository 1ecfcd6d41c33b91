//! Report [`Query`] definitions.
//!
//! [`Query`]: super::Query

pub mod sales;
