//! Cart → checkout → PIX payment lifecycle for a marketplace storefront.
//!
//! The core lives in [`application`]; remote collaborators are reached only
//! through the traits in [`domain::ports`].

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
