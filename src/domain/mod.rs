//! Business rules that do not touch the store: validation, pricing, date
//! windows, aggregation and export.

pub mod dates;
pub mod export;
pub mod money;
pub mod stats;
pub mod validation;
