//! Lambda returns over an imagined trajectory.
//!
//! Rewards, values and continuation flags are sampled as a world model
//! would imagine them; the returns are printed next to the scalar reference.

use burn::backend::NdArray;
use burn::tensor::{Tensor, TensorData};
use dreamer_rl::{compute_lambda_values, compute_lambda_values_scalar, DreamerEvalConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type B = NdArray<f32>;

pub fn run() {
    let config = DreamerEvalConfig::default();
    let horizon = config.horizon;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let rewards: Vec<f32> = (0..horizon).map(|_| rng.gen_range(0.0..1.0)).collect();
    let values: Vec<f32> = (0..horizon).map(|_| rng.gen_range(0.0..5.0)).collect();
    // Episode ends two thirds into the imagination
    let terminal = horizon * 2 / 3;
    let continues: Vec<f32> = (0..horizon).map(|t| if t == terminal { 0.0 } else { 1.0 }).collect();
    let bootstrap = 2.5f32;

    let device = Default::default();
    let column = |data: &[f32]| -> Tensor<B, 3> {
        Tensor::from_data(TensorData::new(data.to_vec(), [data.len(), 1, 1]), &device)
    };

    let returns = compute_lambda_values(
        column(&rewards),
        column(&values),
        column(&continues),
        Some(column(&[bootstrap])),
        horizon,
        config.lmbda,
    )
    .and_then(|tensor| {
        tensor
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| dreamer_rl::ShapeError::InvalidArgument {
                name: "returns",
                reason: format!("{:?}", e),
            })
    });
    let reference =
        compute_lambda_values_scalar(&rewards, &values, &continues, Some(bootstrap), horizon, config.lmbda);

    match (returns, reference) {
        (Ok(returns), Ok(reference)) => {
            println!("{:>4} {:>8} {:>8} {:>5} {:>10} {:>10}", "t", "reward", "value", "cont", "G_t", "scalar");
            println!("{}", "-".repeat(52));
            for t in 0..horizon {
                println!(
                    "{:>4} {:>8.3} {:>8.3} {:>5} {:>10.4} {:>10.4}",
                    t, rewards[t], values[t], continues[t], returns[t], reference[t]
                );
            }
        }
        (Err(e), _) | (_, Err(e)) => log::error!("lambda returns failed: {}", e),
    }
}
