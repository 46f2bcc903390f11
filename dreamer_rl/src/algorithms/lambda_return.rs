//! Lambda-returns for world-model actor/critic targets.
//!
//! The estimator blends one-step TD targets with Monte Carlo returns
//! accumulated up to a bootstrap value:
//! - λ = 0: one-step TD, `r_t + c_t V(s_{t+1})`
//! - λ = 1: Monte Carlo return closed by the bootstrap
//! - λ ∈ (0, 1): interpolation
//!
//! ## Recurrence
//!
//! ```text
//! next_t   = V(s_{t+1})            for t < H-1,   bootstrap for t = H-1
//! input_t  = r_t + c_t * next_t * (1 - λ)
//! G_H      = bootstrap
//! G_t      = input_t + c_t * λ * G_{t+1}
//! ```
//!
//! `c_t` is the continuation flag (0 at terminal steps), so a terminal step
//! cuts every future contribution.
//!
//! ## References
//!
//! - Hafner et al., "Mastering Atari with Discrete World Models" (2021)

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::shape_error::ShapeError;

/// Default imagination horizon.
pub const DEFAULT_HORIZON: usize = 15;

/// Default eligibility-trace decay.
pub const DEFAULT_LAMBDA: f32 = 0.95;

/// Compute lambda-returns over a time-major tensor sequence.
///
/// # Arguments
///
/// * `rewards` - rewards `[T, ...]`
/// * `values` - value estimates `[T, ...]`
/// * `continues` - continuation flags in `[0, 1]`, `[T, ...]`
/// * `bootstrap` - value of the state after the horizon `[1, ...]`, zeros if `None`
/// * `horizon` - number of steps to compute, `1 <= horizon <= T`
/// * `lmbda` - trace decay in `[0, 1]`
///
/// # Returns
///
/// Lambda-returns `[horizon, ...]` in forward time order. Time steps past
/// `horizon` are ignored.
pub fn compute_lambda_values<B: Backend, const D: usize>(
    rewards: Tensor<B, D>,
    values: Tensor<B, D>,
    continues: Tensor<B, D>,
    bootstrap: Option<Tensor<B, D>>,
    horizon: usize,
    lmbda: f32,
) -> Result<Tensor<B, D>, ShapeError> {
    validate_args(horizon, lmbda)?;

    let value_dims = values.dims();
    check_sequence("rewards", &rewards.dims(), &value_dims, horizon)?;
    check_sequence("continues", &continues.dims(), &value_dims, horizon)?;
    check_sequence("values", &value_dims, &value_dims, horizon)?;

    let bootstrap = match bootstrap {
        Some(b) => {
            let dims = b.dims();
            if dims[0] != 1 {
                return Err(ShapeError::BootstrapSteps(dims[0]));
            }
            check_trailing("bootstrap", &dims, &value_dims)?;
            b
        }
        None => {
            let mut dims = value_dims;
            dims[0] = 1;
            Tensor::zeros(dims, &values.device())
        }
    };

    let rewards = rewards.narrow(0, 0, horizon);
    let continues = continues.narrow(0, 0, horizon);

    // Shift values forward by one step, closing the horizon with the bootstrap
    let next_values = if horizon > 1 {
        Tensor::cat(vec![values.narrow(0, 1, horizon - 1), bootstrap.clone()], 0)
    } else {
        bootstrap.clone()
    };

    let interpolated = rewards + continues.clone() * next_values * (1.0 - lmbda);

    let mut acc = bootstrap;
    let mut lambda_values = Vec::with_capacity(horizon);
    for t in (0..horizon).rev() {
        acc = interpolated.clone().narrow(0, t, 1)
            + continues.clone().narrow(0, t, 1) * lmbda * acc;
        lambda_values.push(acc.clone());
    }
    lambda_values.reverse();

    Ok(Tensor::cat(lambda_values, 0))
}

/// Compute lambda-returns for a single trajectory of scalars.
///
/// Same recurrence as [`compute_lambda_values`]; `bootstrap` defaults to 0.
pub fn compute_lambda_values_scalar(
    rewards: &[f32],
    values: &[f32],
    continues: &[f32],
    bootstrap: Option<f32>,
    horizon: usize,
    lmbda: f32,
) -> Result<Vec<f32>, ShapeError> {
    validate_args(horizon, lmbda)?;
    for (name, len) in [
        ("rewards", rewards.len()),
        ("values", values.len()),
        ("continues", continues.len()),
    ] {
        if len < horizon {
            return Err(ShapeError::TooShort { name, len, horizon });
        }
    }

    let bootstrap = bootstrap.unwrap_or(0.0);
    let mut out = vec![0.0f32; horizon];
    let mut acc = bootstrap;

    for t in (0..horizon).rev() {
        let next_value = if t + 1 < horizon { values[t + 1] } else { bootstrap };
        let input = rewards[t] + continues[t] * next_value * (1.0 - lmbda);
        acc = input + continues[t] * lmbda * acc;
        out[t] = acc;
    }

    Ok(out)
}

fn validate_args(horizon: usize, lmbda: f32) -> Result<(), ShapeError> {
    if horizon == 0 {
        return Err(ShapeError::InvalidArgument {
            name: "horizon",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&lmbda) {
        return Err(ShapeError::InvalidArgument {
            name: "lmbda",
            reason: format!("must be in [0, 1], got {}", lmbda),
        });
    }
    Ok(())
}

fn check_sequence<const D: usize>(
    name: &'static str,
    dims: &[usize; D],
    reference: &[usize; D],
    horizon: usize,
) -> Result<(), ShapeError> {
    if dims[0] < horizon {
        return Err(ShapeError::TooShort {
            name,
            len: dims[0],
            horizon,
        });
    }
    check_trailing(name, dims, reference)
}

fn check_trailing<const D: usize>(
    name: &'static str,
    dims: &[usize; D],
    reference: &[usize; D],
) -> Result<(), ShapeError> {
    if dims[1..] != reference[1..] {
        return Err(ShapeError::TrailingMismatch {
            name,
            expected: reference[1..].to_vec(),
            actual: dims[1..].to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_worked_example() {
        let out = compute_lambda_values_scalar(
            &[1.0, 1.0, 1.0],
            &[0.0, 0.0, 0.0, 0.0],
            &[1.0, 1.0, 1.0],
            Some(0.0),
            3,
            0.95,
        )
        .unwrap();

        let expected = [2.8525, 1.95, 1.0];
        for (got, want) in out.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-5, "expected {}, got {}", want, got);
        }
    }

    #[test]
    fn test_scalar_rejects_short_inputs() {
        let err = compute_lambda_values_scalar(&[1.0], &[0.0, 0.0], &[1.0, 1.0], None, 2, 0.95)
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::TooShort {
                name: "rewards",
                len: 1,
                horizon: 2
            }
        );
    }

    #[test]
    fn test_scalar_rejects_bad_lambda() {
        let err = compute_lambda_values_scalar(&[1.0], &[0.0], &[1.0], None, 1, 1.5).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidArgument { name: "lmbda", .. }));
    }
}
