pub mod booking;
pub mod car;
pub mod customer;
pub mod payment;
pub mod tenant;
pub mod webhook;

pub use booking::{Booking, BookingStatus};
pub use car::{Car, CarStatus};
pub use customer::Customer;
pub use payment::{Payment, PaymentStatus};
pub use tenant::Tenant;
pub use webhook::WebhookRegistration;
