pub mod request_sets;
pub mod transport_unit;
pub mod unit_factory;

pub use request_sets::RequestSets;
pub use transport_unit::{TransportUnit, UnitTiming};
pub use unit_factory::UnitFactory;
