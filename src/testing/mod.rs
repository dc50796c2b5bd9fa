//! Unified testing utilities for the reset flow
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (links, reset results, queries)
//! - [`builders`] - [`FlowHarness`], a flow wired to recording collaborators
//! - [`assertions`] - Assertion helpers for navigation and banners
//! - [`mock`] - Mock collaborators that record every call
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resetflow::testing::{fixtures::TestFixtures, FlowHarness};
//!
//! async fn loads_form() {
//!     let harness = FlowHarness::new();
//!     let mut flow = harness.flow(&TestFixtures::query());
//!     flow.load().await;
//! }
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod mock;

pub use assertions::*;
pub use builders::FlowHarness;
pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Valid 64 hex character password-forgot token
    pub const TEST_TOKEN: &str = "1111111111111111111111111111111111111111111111111111111111111111";

    /// Valid 32 hex character verification code
    pub const TEST_CODE: &str = "11111111111111111111111111111111";

    /// Account uid returned by the mock reset
    pub const TEST_UID: &str = "5a2b4e0f8c9d4a7b9e3f1c2d6e8a0b4c";

    /// OAuth client id used for relier tests
    pub const TEST_CLIENT_ID: &str = "dcdb5ae7add825d2";

    /// Relier redirect returned by the mock OAuth handler
    pub const TEST_REDIRECT: &str = "https://relier.example.com/oauth/callback?code=abc";

    /// Content server used by the test navigator
    pub const TEST_CONTENT_SERVER: &str = "https://accounts.example.com";

    /// A password that passes every form rule
    pub const TEST_PASSWORD: &str = "correct horse battery";
}
