pub mod floor;
pub mod building;

pub use floor::{Floor, FloorButtonObserver, FloorRegistry, FloorStatus};
pub use building::Facility;
