pub mod request;

pub use request::{FormInput, GenerationRequest, Language};
