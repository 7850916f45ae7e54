//! Achaar Bazaar Server - pickle marketplace backend
//!
//! # Architecture overview
//!
//! - **HTTP API** (`api`): RESTful surface for auth, catalog, cart,
//!   orders, recipes, Didi onboarding, location and training
//! - **Database** (`db`): embedded SurrealDB models and repositories
//! - **Auth** (`auth`): JWT + Argon2 authentication, role gating, OTPs
//! - **Pricing** (`pricing`): decimal money helpers and the recipe
//!   price calculator
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT, middleware, extractor, OTP
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # models and repositories
//! ├── pricing/       # money arithmetic, recipe calculator
//! └── utils/         # error, logger, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod pricing;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - structured security events via tracing
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ___       __
   /   | ____/ /_  ____ _____ ______
  / /| |/ ___/ __ \/ __ `/ __ `/ ___/
 / ___ / /__/ / / / /_/ / /_/ / /
/_/  |_\___/_/ /_/\__,_/\__,_/_/
    ____
   / __ )____ _____  ____ _____ ______
  / __  / __ `/_  / / __ `/ __ `/ ___/
 / /_/ / /_/ / / /_/ /_/ / /_/ / /
/_____/\__,_/ /___/\__,_/\__,_/_/
    "#
    );
}
