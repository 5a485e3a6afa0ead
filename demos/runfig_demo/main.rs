//! # runfig demo application
//!
//! A sample training-script entry point that showcases how to integrate
//! runfig into a real program. This is **not** a real trainer; it exists
//! purely to demonstrate and manually verify runfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example runfig_demo -- --epochs 10
//! cargo run --example runfig_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                        |
//! |--------------------------|---------------------------------------------------------------------------|
//! | Declared defaults        | `-- --epochs 10`                                                          |
//! | Required switch          | `--` (fails: missing `epochs`)                                            |
//! | Toggle                   | `-- --epochs 10 --amp --optim.nesterov`                                   |
//! | Choices                  | `-- --epochs 10 --batch_size 64` (`--batch_size 48` fails)                |
//! | Bounds                   | `-- --epochs 10 --optim.lr 2` fails                                       |
//! | Fixed-size list          | `-- --epochs 10 --optim.milestones 10 20` (`10 20 30` fails)              |
//! | Nested file              | `-- --epochs 10 --model model.yaml`                                       |
//! | File then override       | `-- --epochs 10 --model model.yaml --model.depth 50`                      |
//! | Unconsumed arguments     | `-- --epochs 10 --wandb on` (warns), add `--strict-args` to fail          |
//! | Job directory + snapshot | `-- --epochs 10 --job-dir` writes `outputs/<run id>/run.yaml`             |
//! | Debug logging            | `RUST_LOG=runfig=debug cargo run --example runfig_demo -- --epochs 10`    |

mod config;

use runfig::{Config, RunContext, Runfig, RunfigError, UnconsumedPolicy};
use tracing_subscriber::EnvFilter;

use config::TrainConfig;

// ---------------------------------------------------------------------------
// Demo-only flags
// ---------------------------------------------------------------------------

/// Flags handled by the demo itself rather than the schema. Stripped from
/// argv before loading.
const JOB_DIR_FLAG: &str = "--job-dir";
const STRICT_ARGS_FLAG: &str = "--strict-args";

fn train(config: &Config, ctx: &RunContext) -> Result<(), RunfigError> {
    let typed: TrainConfig = config.deserialize_into()?;

    println!("run {}", ctx.id());
    if let Some(revision) = ctx.git_revision() {
        println!("git {revision}");
    }
    if let Some(dir) = ctx.job_dir() {
        println!("job dir {}", dir.display());
    }
    println!();
    println!("{config}");
    println!();

    let seed = typed
        .seed
        .map_or_else(|| "none".to_string(), |s| s.to_string());
    println!(
        "training {:?} (depth {}) for {} epochs, batch {}, lr {}, seed {seed}",
        typed.model.arch, typed.model.depth, typed.epochs, typed.batch_size, typed.optim.lr,
    );
    if typed.amp {
        println!("mixed precision on");
    }
    println!(
        "lr decays at epochs {:?} (nesterov: {})",
        typed.optim.milestones, typed.optim.nesterov
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    let job_dir = take_flag(&mut args, JOB_DIR_FLAG);
    let strict_args = take_flag(&mut args, STRICT_ARGS_FLAG);

    let schema = config::schema().unwrap_or_else(|e| e.exit());

    let mut builder = Runfig::builder(schema)
        .app_name("runfig-demo")
        .about("runfig demo: a pretend training run");
    if job_dir {
        builder = builder.change_job_dir();
    }
    if strict_args {
        builder = builder.unconsumed(UnconsumedPolicy::Fail);
    }

    match builder.run_from(args, train) {
        Ok(Ok(())) => {}
        Ok(Err(e)) | Err(e) => e.exit(),
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}
