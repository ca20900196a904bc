pub mod authority;
pub mod host;
pub mod identity;
pub mod liveness;
pub mod object_model;
pub mod payload;
pub mod remote;
