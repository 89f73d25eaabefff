mod api;
mod config;
mod error;

mod data_objects;

pub use api::EscrowApiClient;
pub use config::{Environment, EscrowApiConfig};
pub use data_objects::{
    AllocationRef,
    BankAccount,
    Calculation,
    NewAllocation,
    NewTransaction,
    PartyInput,
    PingResult,
    PingStatus,
    Profile,
    ProfileOrganization,
    ProfileUser,
    TokenDetails,
    TokenIdentity,
    TokenRef,
    TokenUser,
    TransactionRef,
    TransactionSnapshot,
};
pub use error::EscrowApiError;
