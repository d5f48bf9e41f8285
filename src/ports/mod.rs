pub mod catalog;
pub mod loan_history;
pub mod rental_ledger;

pub use catalog::{Catalog, RemoveOutcome};
pub use loan_history::{BorrowerLoanView, LoanHistory};
pub use rental_ledger::{LedgerTransaction, RentalLedger};
