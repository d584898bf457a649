pub mod result;
pub mod validator;

pub use result::ValidationResult;
pub use validator::CodeValidator;
