mod insee;
mod value;

pub use insee::{Insee, OUTSIDE};
pub use value::{Value, NA_TOKEN};
