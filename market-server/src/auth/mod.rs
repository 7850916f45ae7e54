//! Authentication module: JWT, middleware, extractor and OTPs

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod otp;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use otp::{Otp, OtpPurpose, deliver_otp};
