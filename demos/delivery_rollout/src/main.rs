use anyhow::Context;
use clap::{Parser, ValueEnum};
use delivery_rs::{Action, DeliveryConfig, DeliveryEnv};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Uniform over the action space.
    Random,
    /// Walk to the pickup cell, then back to the drop-off.
    Greedy,
}

#[derive(Parser, Debug)]
#[command(name = "delivery_rollout", about = "Run agents against the grid delivery environment")]
struct Args {
    #[arg(long, default_value_t = 3)]
    width: i32,
    #[arg(long, default_value_t = 1)]
    height: i32,
    #[arg(long, default_value_t = 50)]
    max_steps: u32,
    #[arg(long, default_value_t = 5)]
    episodes: u32,
    #[arg(long, value_enum, default_value_t = Policy::Greedy)]
    policy: Policy,
    #[arg(long, default_value_t = 10)]
    seed: u64,
    #[arg(long)]
    random_start: bool,
    #[arg(long)]
    done_on_delivery: bool,
    /// Print the grid after every step.
    #[arg(long)]
    render: bool,
}

fn greedy_action(env: &DeliveryEnv) -> Action {
    let cfg = env.config();
    let (x, y) = env.position();
    let target = if env.carrying() { cfg.dropoff_cell() } else { cfg.pickup_cell() };
    if y < target.1 {
        Action::Down
    } else if y > target.1 {
        Action::Up
    } else if x < target.0 {
        Action::Right
    } else {
        Action::Left
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let cfg = DeliveryConfig {
        width: args.width,
        height: args.height,
        max_steps: args.max_steps,
        random_start: args.random_start,
        done_on_delivery: args.done_on_delivery,
        seed: args.seed,
        ..Default::default()
    };
    let mut env = DeliveryEnv::new(cfg);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let n_actions = env.num_actions() as i64;

    let mut returns = Vec::with_capacity(args.episodes as usize);
    for episode in 0..args.episodes {
        env.reset();
        if args.render {
            env.render();
        }
        let mut deliveries = 0u32;
        loop {
            let action = match args.policy {
                Policy::Random => rng.gen_range(0..n_actions),
                Policy::Greedy => greedy_action(&env) as i64,
            };
            let out = env
                .step(action)
                .with_context(|| format!("episode {episode}, step {}", env.step_count()))?;
            if out.info.delivered {
                deliveries += 1;
            }
            if args.render {
                env.render();
            }
            if out.done {
                break;
            }
        }
        tracing::info!(episode, steps = env.step_count(), deliveries, total_reward = env.total_reward(), "episode done");
        returns.push(env.total_reward());
    }

    if !returns.is_empty() {
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        tracing::info!(episodes = returns.len(), mean_return = mean, "rollout finished");
    }
    Ok(())
}
