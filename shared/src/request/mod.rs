mod pending_requests;

pub use pending_requests::{PendingRequest, PendingRequests};
