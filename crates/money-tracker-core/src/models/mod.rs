//! Data models for money-tracker entities.
//!
//! - `User` and the dj-rest-auth request/response payloads
//! - Finance records: `Currency`, `ExchangeRate`, `Income`, `Expense`,
//!   `Asset`, `Loan`, `InterestType`
//! - Dashboard aggregates: `IncomeTotals`, `AssetTotals`, `ExpenseTotals`,
//!   `LiabilityTotals`

pub mod finance;
pub mod user;

pub use finance::{
    Amount, Asset, AssetTotals, Currency, ExchangeRate, Expense, ExpenseTotals, Income,
    IncomeTotals, InterestType, LiabilityTotals, Loan, LocalCurrency,
};
pub use user::{
    DetailResponse, LoginResponse, PasswordChange, PasswordResetConfirm, ProfileImage,
    ProfileUpdate, Registration, User,
};
