pub mod pending_calls;
pub mod assignment;
pub mod dispatcher;

pub use pending_calls::{CallStatus, PendingCall, PendingCallTable};
pub use assignment::{select_unit, EligibilityTier, Selection, ELIGIBILITY_TIERS};
pub use dispatcher::Dispatcher;
