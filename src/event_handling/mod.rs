pub mod observer;
pub mod event_handler;

pub use observer::{FnObserver, ObserverId, ObserverRegistry, UnitObserver};
pub use event_handler::{EventForwarder, EventHandler};
