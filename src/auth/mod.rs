pub mod password;
pub mod role;
pub mod routes;
pub mod session;

pub use password::*;
pub use role::*;
pub use routes::*;
pub use session::*;
