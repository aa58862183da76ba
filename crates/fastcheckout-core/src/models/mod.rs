//! Domain models shared by the API, the plugin system and the Core API client.

pub mod cart;
pub mod checkout;
pub mod events;
pub mod order;
pub mod tenant;

pub use cart::{Cart, CartItem};
pub use checkout::{CheckoutData, CheckoutSession, CheckoutStatus, PaymentMethod, ShippingAddress};
pub use events::{
    CartValidation, CheckoutAnalytics, CheckoutMetricsEvent, MetricsEventKind, WebhookEvent,
    WebhookEventType,
};
pub use order::{NewOrder, Order, OrderStatus};
pub use tenant::{PayPalConfig, PayPalMode, ShippingConfig, ShippingMethod, StripeConfig, Tenant};
