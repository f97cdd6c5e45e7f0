//! Shared Kernel
//!
//! Vocabulary shared by every backend crate:
//! - The unified HTTP-facing error type ([`error::app_error::AppError`])
//! - Field-level error descriptors returned on validation failures
//! - Typed UUID identifiers

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod detail;
    pub mod kind;
}
pub mod id;
