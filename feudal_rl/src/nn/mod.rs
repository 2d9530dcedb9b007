//! Network modules.
//!
//! - [`feudal_net`]: reference manager/worker network implementing [`FeudalPolicy`](crate::model::FeudalPolicy)

pub mod feudal_net;

pub use feudal_net::{FeudalNet, FeudalNetConfig, FeudalState};
