//! Data Models
//!
//! Passive records mapped to SurrealDB tables. Derived fields
//! (timestamps, tokens, availability) are computed by explicit
//! constructors/update functions invoked by the repositories, never by
//! implicit persistence hooks.

pub mod serde_helpers;

// Auth
pub mod user;

// Catalog & commerce
pub mod cart;
pub mod order;
pub mod product;
pub mod recipe;

// Didi domain
pub mod didi_profile;
pub mod location_ping;
pub mod training;

// Re-exports
pub use cart::{Cart, CartId, CartItem, CartItemAdd, CartItemQuantityUpdate, CartView};
pub use didi_profile::{
    ApprovalStatus, DidiApprovalRequest, DidiOnboardingRequest, DidiProfile, DidiProfileId,
    TrainingStatus,
};
pub use location_ping::{LocationPing, LocationPingRequest};
pub use order::{
    Address, AssignOrderRequest, Order, OrderCreateRequest, OrderId, OrderItem, OrderStatus,
    OrderStatusUpdate, OrderView, PaymentFailureRequest, PaymentStatus, PaymentSuccessRequest,
};
pub use product::{Product, ProductCreate, ProductId, ProductUpdate};
pub use recipe::{
    CustomRecipe, CustomRecipeRequest, RecipeId, RecipePriceCalculationRequest, RecipeStatus,
};
pub use training::{
    ContentType, Difficulty, ProgressStatus, TrainingContent, TrainingContentCreate,
    TrainingContentUpdate, TrainingProgress, TrainingProgressUpdate,
};
pub use user::{User, UserId};
