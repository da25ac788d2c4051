pub mod api_keys;
pub mod enhancements;
pub mod generations;
pub mod payments;
pub mod token_balances;
pub mod users;

pub use api_keys::ApiKeysDao;
pub use enhancements::{CategoryEntry, EnhancementsDao};
pub use generations::GenerationsDao;
pub use payments::PaymentsDao;
pub use token_balances::{DebitOutcome, DebitReceipt, ExpiryWarning, TokenBalancesDao};
pub use users::UsersDao;
