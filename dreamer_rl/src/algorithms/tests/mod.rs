//! Behavioural tests for the algorithms module.
//!
//! # Test Organization
//!
//! - `lambda_return_tests`: recurrence, λ extremes, terminal masking, shapes
//! - `stochastic_state_tests`: one-hot property and straight-through gradients

pub mod stochastic_state_tests;
