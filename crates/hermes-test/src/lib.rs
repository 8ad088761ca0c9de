//! # Hermes Test
//!
//! In-memory testing for Hermes applications.
//!
//! [`MemoryDriver`] is a full [`Driver`](hermes_middleware::Driver): the
//! executor registers routes on it exactly as on the hyper driver, and
//! [`MemoryDriver::call`] runs a request through the same pipeline without
//! binding a port. [`TestClient`] wraps it with a request builder and
//! [`TestResponse`] assertions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_metadata::{MetadataArgsStorage, Param};
//! use hermes_test::TestClient;
//!
//! let mut storage = MetadataArgsStorage::new();
//! storage
//!     .json_controller::<QuestionController>("/questions")
//!     .get("/:id", "one", |_ctl, args| async move {
//!         let id: i64 = args.get(0)?;
//!         Ok::<_, HttpError>(Json(json!({ "id": id })))
//!     })
//!     .param(Param::path("id").format(ParamFormat::Integer))
//!     .end();
//!
//! let client = TestClient::from_storage(&storage)?;
//! client
//!     .get("/questions/1")
//!     .send()
//!     .await
//!     .assert_status(StatusCode::OK)
//!     .assert_json(&json!({ "id": 1 }));
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod driver;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use driver::MemoryDriver;
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
