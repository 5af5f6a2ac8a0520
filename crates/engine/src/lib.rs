//! Flexi engine.
//!
//! Owns the flexi-dollar ledger (users, balances, budget settings,
//! transactions), the Flexi Fairy directory and the fairy request state
//! machine. Every operation runs against the database handle given to
//! [`EngineBuilder`]; nothing is cached in memory between calls.

pub use balances::Balance;
pub use budget_settings::{BudgetSettings, BudgetSettingsUpdate, WeeklySummary};
pub use error::{EngineError, ErrorKind};
pub use fairy_requests::{
    FairyRequest, FairyRequestStatus, LeaderboardEntry, MAX_PENDING_REQUESTS, Timeframe,
};
pub use fairy_status::{ActiveFairies, FairyProfile, FairySort, FairyStats, FairyStatus};
pub use location::Location;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, NewUser};
pub use transactions::{Transaction, TransactionKind, TransactionPage};
pub use users::User;

mod balances;
mod budget_settings;
mod error;
mod fairy_requests;
mod fairy_status;
mod location;
mod money;
mod ops;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
