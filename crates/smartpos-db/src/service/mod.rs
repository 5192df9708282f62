//! # Service Module
//!
//! Operations that span several repositories inside one transaction.
//!
//! - [`SaleService`](sale::SaleService) - create, read and list sales, check credit

pub mod sale;
