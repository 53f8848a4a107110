mod error;
mod label;

pub use self::error::ErrorComponents;
pub use self::label::Label;
