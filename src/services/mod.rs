//! External-service integrations and the linear workflows built on them

pub mod billing;
pub mod blog;
pub mod email;
pub mod payments;
pub mod user_admin;

pub use billing::{
    activate_trial, cancel_subscription, create_checkout, CheckoutRequest, TrialActivation,
};
pub use blog::{generate_blog_post, slugify};
pub use email::{EmailSender, MockEmailSender, OutgoingEmail, ResendClient};
pub use payments::{CheckoutParams, CheckoutSession, MockPayments, PaymentProvider, StripeClient};
pub use user_admin::{CreatedUser, MemoryUserAdmin, NewUser, SupabaseAuthAdmin, UserAdmin};
