//! Type classification and promotion.

mod data_type;

pub use data_type::DataType;
