pub mod campaign;
pub mod dataset;
pub mod geometry;
pub mod positions;
pub mod qos;
pub mod repository;
pub mod scenario;

pub use campaign::{Campaign, CampaignConfig, ParamGrid};
pub use dataset::{DatasetBuilder, DatasetConfig};
pub use repository::Repository;
pub use scenario::ScenarioParams;

pub mod prelude {
    pub use crate::campaign::{Campaign, CampaignConfig, Ns3Runner, ParamGrid, ParamSet, SimulationRunner};
    pub use crate::dataset::selector::LabelPolicy;
    pub use crate::dataset::aggregate::MissingCell;
    pub use crate::dataset::{Dataset, DatasetBuilder, DatasetConfig, TrainingRow};
    pub use crate::geometry::Point;
    pub use crate::positions::{PositionConfig, Shape};
    pub use crate::scenario::{ParamValue, ScenarioParams};
}
