mod error;
mod global_ref;
mod identity_cache;
mod local_id;
mod path_remapper;


pub use error::IdentityError;
pub use global_ref::{GlobalRef, OuterChain};
pub use identity_cache::{IdentityCache, IdentityConfig};
pub use local_id::{IdNamespace, LocalId};
pub use path_remapper::{PathRemapper, SessionPrefixRemapper};
