//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `hash`: content digests (the upload idempotency key)
//! - `accept`: upload candidate validation
//! - `format`: human-readable formatting (sizes, etc.)

mod accept;
mod format;
mod hash;

pub use accept::{candidate_from_path, validate_candidate, UploadCandidate, ValidationError};
pub use format::format_size;
pub use hash::sha256_hex;
