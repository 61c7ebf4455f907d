pub mod identity;
pub mod principal;
