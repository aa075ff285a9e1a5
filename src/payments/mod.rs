pub mod processor;
pub mod signature;

pub use processor::{
    Authorization, AuthorizationMetadata, MockProcessor, PaymentProcessor, ProcessorError,
    StripeProcessor,
};
