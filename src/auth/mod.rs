pub mod session;
pub mod token;

pub use session::{authorize, AuthorizedUser, ACCESS_TOKEN_COOKIE};
pub use token::{AuthError, Claims, TokenService};
