//! Schema and typed view for the runfig demo application.
//!
//! The root [`Train`] schema holds a few top-level knobs and two nested
//! schemas, `model` and `optim`. Each nested schema can be filled from its
//! own file (`--model model.yaml`) and overridden field by field
//! (`--model.depth 50`).
//!
//! | Switch               | Kind                        | Default      |
//! |----------------------|-----------------------------|--------------|
//! | `--epochs`           | int, required               |              |
//! | `--batch_size`       | int, one of 32/64/128       | 32           |
//! | `--amp`              | toggle                      | off          |
//! | `--seed`             | optional int                | not set      |
//! | `--model`            | nested file                 |              |
//! | `--model.arch`       | enum                        | resnet       |
//! | `--model.depth`      | int in [1, 200]             | 18           |
//! | `--optim`            | nested file                 |              |
//! | `--optim.lr`         | float in [0, 1]             | 0.1          |
//! | `--optim.milestones` | exactly two ints            | 30 60        |
//! | `--optim.nesterov`   | toggle                      | on           |

use serde::Deserialize;

use runfig::{DeclaredType, EnumBinding, Field, PrimitiveKind, RunfigError, Schema};

/// Build the demo schema.
pub fn schema() -> Result<Schema, RunfigError> {
    let model = Schema::builder("Model")
        .field(
            Field::enumeration("arch", EnumBinding::new("Arch", ["resnet", "vit", "mlp"]))
                .with_default("resnet")
                .with_help("network family"),
        )
        .field(
            Field::int("depth")
                .bounded(Some(1.0), Some(200.0))
                .with_default(18)
                .with_help("number of layers"),
        )
        .build()?;

    let optim = Schema::builder("Optim")
        .field(
            Field::float("lr")
                .bounded(Some(0.0), Some(1.0))
                .with_default(0.1)
                .with_help("learning rate"),
        )
        .field(
            Field::list("milestones", PrimitiveKind::Int)
                .sequence([30, 60], Some(2))
                .with_help("epochs at which the learning rate decays"),
        )
        .field(Field::bool("nesterov", true).with_help("disable Nesterov momentum"))
        .build()?;

    Schema::builder("Train")
        .field(Field::int("epochs").required().with_help("training epochs"))
        .field(
            Field::int("batch_size")
                .choices([32, 64, 128])
                .meta("value_name", "N"),
        )
        .field(Field::bool("amp", false).with_help("use mixed precision"))
        .field(
            Field::new("seed", DeclaredType::optional(DeclaredType::Int))
                .with_help("random seed"),
        )
        .field(Field::nested("model", model))
        .field(Field::nested("optim", optim))
        .build()
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Resnet,
    Vit,
    Mlp,
}

#[derive(Deserialize, Debug)]
pub struct ModelConfig {
    pub arch: Arch,
    pub depth: u32,
}

#[derive(Deserialize, Debug)]
pub struct OptimConfig {
    pub lr: f64,
    pub milestones: Vec<u32>,
    pub nesterov: bool,
}

/// Typed view of a resolved [`Train`](schema) config.
#[derive(Deserialize, Debug)]
pub struct TrainConfig {
    pub epochs: u32,
    pub batch_size: u32,
    pub amp: bool,
    pub seed: Option<u64>,
    pub model: ModelConfig,
    pub optim: OptimConfig,
}
