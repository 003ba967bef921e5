//! The portal workflow: sign in, collect courses, walk module pages and
//! trigger downloads.

pub mod drive;
pub mod selectors;
pub mod session;

pub use session::PortalSession;
