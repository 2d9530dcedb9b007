//! Core building blocks shared by the network modules.

pub mod recurrent;

pub use recurrent::{HiddenState, LstmCell, LstmCellConfig};
