//! Record repositories.
//!
//! One repository per table. Every operation on owned records takes an explicit
//! [`Caller`](crate::Caller) and applies the predicates from [`crate::authorization`].

pub mod assignments;
pub mod doctors;
pub mod patients;
pub(crate) mod shared;
