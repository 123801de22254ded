#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]
#![deny(unused_must_use)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod dispatcher;
pub mod error;
pub mod handler;
mod id;
pub mod route;
pub mod session;
pub mod view;

pub use dispatcher::{Dispatcher, DispatcherConfig, Host, Navigation, NavigationOutcome};
pub use handler::{Handler, HandlerRef, LoadContext};
pub use id::{HandlerId, ViewId};
pub use route::{Parameters, RouteTable};
pub use session::SessionStore;
pub use view::{Perspective, View, ViewEntry, ViewPerspectiveKey, ViewRef, ViewRegistry};
