pub mod bookings;
pub mod cars;
pub mod payments;

pub use bookings::{BookingService, CreateBooking, ReturnCar, ReturnOutcome};
pub use cars::{CarService, NewCarRequest, UpdateCarRequest};
pub use payments::PaymentService;
