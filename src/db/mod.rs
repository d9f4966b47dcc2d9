pub mod account;
pub mod guest;
pub mod house;
