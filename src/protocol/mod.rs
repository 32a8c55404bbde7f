//! Wire-level protocol definitions.
//!
//! Everything the client knows about the service's HTTP surface lives here:
//! which operations exist, how their URLs are built, and how a raw response
//! maps onto a payload or an error.
//!
//! # Module Organization
//!
//! ```text
//! protocol/
//! ├── routes   - The closed Operation table (verbs, URL templates, error codes)
//! └── classify - Pure response classification into payloads or errors
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Operation`] | One logical service operation with its route metadata |
//! | [`classify`] | Turns (operation, status, body) into a payload or error |

pub mod classify;
pub mod routes;

pub use classify::classify;
pub use routes::Operation;

/// Protocol constants shared by dispatch and the tests.
pub mod constants {
    /// Header names attached to requests.
    pub mod headers {
        /// Carries the caller's API key on every call except the token
        /// exchange itself.
        pub const API_KEY: &str = "x-api-key";
    }
}
