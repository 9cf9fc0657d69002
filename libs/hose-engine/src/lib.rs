//! Hoses and hose gangs: blocking reads over pools, and fan-in over any
//! mix of pools and time-cognizant sources from a single caller, with no
//! thread per member.

mod awaiter;
mod gang;
mod hose;

pub use gang::HoseGang;
pub use hose::Hose;
