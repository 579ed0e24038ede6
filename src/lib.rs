pub mod asset_pipeline;
pub mod camera;
pub mod demo;
pub mod error;
pub mod rendering;
pub mod scene_graph;
pub mod session;
pub mod window;

pub use error::{FrameError, ImportError, SceneError};
pub use rendering::backend::{DrawableId, RenderBackend};
pub use scene_graph::{
    Connector, ConnectorKey, Endpoint, PositionUpdate, Primitive, PrimitiveKey, PrimitiveKind,
    Scene, ShapeParams,
};
pub use session::{ImportTicket, ViewportSession};
