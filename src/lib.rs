pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod session;
pub mod store;

pub use engine::{AvailabilityCache, AvailabilityEngine, EngineError, FetchErrorPolicy};
pub use model::{
    AlternativeRooms, DayAvailability, RangeCheck, Reservation, ReservationSource,
    ReservationStatus, Room, StayRange,
};
pub use session::{PickerSession, SessionToken};
pub use store::{InMemoryReservationStore, ReservationStore, StoreError};
