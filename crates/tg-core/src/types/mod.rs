pub mod event;
pub mod finding;
pub mod graph;
pub mod ids;
pub mod io;
pub mod run;
pub mod value;

pub use event::{AgentType, EventRecord, EventType, PairKind};
pub use finding::{Evidence, Finding, FindingCategory, Severity};
pub use graph::{
    AgentNode, EdgeKind, EventNode, Graph, GraphEdge, GraphNode, NodeData, NodeKind, ToolCall,
    ToolNode,
};
pub use ids::{IdError, RunId};
pub use io::RecordEventInput;
pub use run::{Run, RunStatus, RunSummary};
pub use value::{MetaMap, MetaValue};
