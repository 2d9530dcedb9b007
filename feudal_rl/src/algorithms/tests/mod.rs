//! Behavioral tests for the FeUdal return and loss computations.
//!
//! # Test Organization
//!
//! - `returns_tests`: scalar return / GAE / horizon-pairing recursions
//! - `feudal_loss_tests`: loss values and gradient routing on an autodiff backend
