use anyhow::{bail, Context, Result};
use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    /// Uniform over `[-range, range]` on both axes.
    Square { range: i64 },
    /// Uniform over the integer points of a disc.
    Disc { radius: i64, center_x: i64, center_y: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionConfig {
    pub count: usize,
    pub shape: Shape,
    pub seed: Option<u64>,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            count: 2000,
            shape: Shape::Square { range: 100 },
            seed: None,
        }
    }
}

impl PositionConfig {
    pub fn with_disc(mut self, radius: i64) -> Self {
        self.shape = Shape::Disc {
            radius,
            center_x: 0,
            center_y: 0,
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub fn generate(config: &PositionConfig) -> Result<Vec<Position>> {
    validate(&config.shape)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    Ok((0..config.count)
        .map(|_| sample(&config.shape, &mut rng))
        .collect())
}

fn validate(shape: &Shape) -> Result<()> {
    match *shape {
        Shape::Square { range } if range < 0 => bail!("Square range must be non-negative, got {}", range),
        Shape::Disc { radius, .. } if radius < 0 => bail!("Disc radius must be non-negative, got {}", radius),
        Shape::Disc { radius, center_x, center_y } => {
            // x * x + y * y and the recentred point must fit in i64
            let offset = |c: i64| c.checked_abs().and_then(|c| c.checked_add(radius));
            let fits = radius
                .checked_mul(radius)
                .and_then(|r2| r2.checked_mul(2))
                .and(offset(center_x))
                .and(offset(center_y));
            if fits.is_none() {
                bail!("Disc of radius {} around ({}, {}) overflows", radius, center_x, center_y);
            }
            Ok(())
        }
        Shape::Square { .. } => Ok(()),
    }
}

fn sample(shape: &Shape, rng: &mut impl Rng) -> Position {
    match *shape {
        Shape::Square { range } => Position {
            x: rng.gen_range(-range..=range),
            y: rng.gen_range(-range..=range),
        },
        Shape::Disc { radius, center_x, center_y } => {
            let limit = radius * radius;
            loop {
                let x = rng.gen_range(-radius..=radius);
                let y = rng.gen_range(-radius..=radius);
                if x * x + y * y <= limit {
                    return Position {
                        x: x + center_x,
                        y: y + center_y,
                    };
                }
            }
        }
    }
}

/// Writes `x y` lines, the format the training scenario reads at startup.
pub fn write_positions(path: impl AsRef<Path>, positions: &[Position]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for position in positions {
        writer.serialize(position)?;
    }
    writer.flush()?;

    info!("Wrote {} positions to {}", positions.len(), path.display());
    Ok(())
}
