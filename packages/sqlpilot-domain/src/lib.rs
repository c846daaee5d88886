pub mod context;
pub mod profile;
pub mod prompt;
pub mod response;
pub mod schema;
pub mod validator;
