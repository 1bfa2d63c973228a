//! The five dataset analyses.
//!
//! Each submodule is independent: it loads its own table, reduces it with
//! [`crate::stats`], and prints or charts the result.

pub mod demographic;
pub mod mean_var_std;
pub mod medical;
pub mod page_views;
pub mod sea_level;
pub mod types;
