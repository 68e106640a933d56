// Reservation server access: wire format, errors and the injected API seam

pub mod client;
pub mod errors;
pub mod types;

pub use client::{HttpReservationClient, ReservationApi};
#[cfg(any(test, feature = "testing"))]
pub use client::MockReservationApi;
pub use errors::ApiError;
pub use types::{ClientInfo, ClientRecord, OrderItem, ReservationId, ServeOutcome};
