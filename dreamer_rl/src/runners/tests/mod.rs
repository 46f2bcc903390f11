//! Test suite for the evaluation runners.
//!
//! # Test Organization
//!
//! - `greedy_eval_tests`: episode lifecycle, preprocessing, action conversion
//!
//! # Invariants Tested
//!
//! 1. **Episode lifecycle**
//!    - the environment is closed exactly once, also on failure
//!    - the player is fixed to one environment and reset before the first step
//!
//! 2. **Termination**
//!    - terminated, truncated, dry run and the step limit all end the episode
//!
//! 3. **Reporting**
//!    - one reward line and one cumulative-reward metric on success, nothing on failure
