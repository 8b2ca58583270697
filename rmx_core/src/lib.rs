pub mod signout;
pub mod types;
pub mod upload;
