pub mod level;
pub mod direction;
pub mod states;
pub mod snapshot;
pub mod events;

pub use level::*;
pub use direction::*;
pub use states::*;
pub use snapshot::*;
pub use events::*;

use chrono::{Local, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
