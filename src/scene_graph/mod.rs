pub mod connector;
pub mod geometry;
pub mod ids;
pub mod import;
pub mod primitive;
pub mod scene;

// Re-export main types for convenience
pub use connector::{Connector, ConnectorKey, Endpoint};
pub use geometry::{Geometry, GeometryKey, TransformNode, TransformNodeKey};
pub use ids::IdGenerator;
pub use primitive::{PositionUpdate, Primitive, PrimitiveKey, PrimitiveKind, Shape, ShapeParams};
pub use scene::Scene;
