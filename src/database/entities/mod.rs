pub mod api_keys;
pub mod category_enhancements;
pub mod enhancements;
pub mod generations;
pub mod payments;
pub mod token_balances;
pub mod users;

pub use api_keys::Entity as ApiKeys;
pub use category_enhancements::Entity as CategoryEnhancements;
pub use enhancements::Entity as Enhancements;
pub use generations::Entity as Generations;
pub use payments::Entity as Payments;
pub use token_balances::Entity as TokenBalances;
pub use users::Entity as Users;

// Type aliases
pub type UserRecord = users::Model;
pub type TokenBalance = token_balances::Model;
pub type Enhancement = enhancements::Model;
pub type CategoryEnhancement = category_enhancements::Model;
pub type GenerationRecord = generations::Model;
pub type PaymentRecord = payments::Model;
pub type ApiKeyRecord = api_keys::Model;

pub use payments::PaymentStatus;
pub use users::SubscriptionPlan;
