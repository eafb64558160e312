//! Consortium lending core.
//!
//! A loan is funded by several partner banks, each owning a split of the
//! principal. Payments are allocated across splits, and aggregate figures
//! (remaining debt, percent paid, balances) are always derived from the
//! committed state in the database.

pub use bank_accounts::BankAccount;
pub use bank_transactions::{BankTransaction, TransactionHistory};
pub use banks::Bank;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{AllocationSpec, NewLoanCmd, PaymentCmd, PostingCmd, SplitSpec};
pub use credit_applications::{ApplicationStatus, CreditApplication};
pub use error::EngineError;
pub use loan_payments::Payment;
pub use loan_splits::LoanSplit;
pub use loans::{Loan, LoanStatus};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, LoanDetail, UserSummary};
pub use payment_allocations::Allocation;
pub use rate::Rate;
pub use users::User;

mod bank_accounts;
mod bank_transactions;
mod banks;
mod clock;
mod commands;
mod credit_applications;
mod error;
mod loan_payments;
mod loan_splits;
mod loans;
mod money;
mod ops;
mod password;
mod payment_allocations;
mod rate;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
