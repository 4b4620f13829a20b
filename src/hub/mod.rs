//! Pipe hub engine
//!
//! Classification and traversal are pure reads of the host graph. Port and
//! label maintenance goes through [`HubEditor`]; [`PipeHubEngine`] turns host
//! events into deferred work.

pub mod cascade;
pub mod downstream;
pub mod engine;
pub mod origin;
pub mod ports;
pub mod role;
pub mod route;
pub mod scheduler;
pub mod state;

pub use cascade::{collect_connected_hubs, fix_component, run_fix, topo_order, FixReport};
pub use downstream::{find_downstream_hubs, find_hubs_from_output};
pub use engine::{HubCommand, MenuOption, PipeHubEngine};
pub use origin::{resolve_origin, source_label, upstream_hub, Origin, SourceLabel};
pub use ports::HubEditor;
pub use role::{classify, find_gets_by_key, find_sets_by_key, NodeRole};
pub use route::{route, RouteOutput};
pub use scheduler::{Scheduler, Task};
pub use state::{HubState, HubStates, PairMeta};
