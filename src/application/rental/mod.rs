mod errors;
mod history;
mod rental_service;

pub use errors::{RentalApplicationError, Result};
pub use history::{get_loan, list_all_history, list_borrower_history};
pub use rental_service::{ServiceDependencies, borrow_book, return_book};
