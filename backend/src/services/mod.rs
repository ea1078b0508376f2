//! Service layer: availability catalog, slot generation, booking ledger and
//! the booking validator, plus the transport-facing operations built on them.
//!
//! Services are free async functions generic over the repository traits they
//! need, so both `&LocalRepository` and `&dyn FullRepository` can be passed.

pub mod availability;
pub mod booking_service;
pub mod ledger;
pub mod slots;
pub mod validator;

pub use booking_service::{
    add_availability, cancel_booking, create_booking, create_coach, list_user_bookings,
    query_slots,
};
pub use slots::{AvailableSlots, SlotIter};
pub use validator::BookingStage;
