//! Generic list view engine and its lifecycle around the command bus.
//!
//! Every list view of the console shares one interaction contract: free-text
//! search, single-column sort, fixed-size pagination, and persisted column
//! visibility. The engine implements that contract once, parameterized by row
//! shape and column set, instead of once per page:
//! - `record`: the row abstraction and its field value coercions
//! - `state`: view state, sort spec, and the page invariants
//! - `engine`: the derived-state pipeline (filter, sort, paginate)
//! - `controller`: command handling, refresh, create, and import outcomes
//! - `mount`: subscription lifecycle tying a controller to the command bus

mod controller;
mod engine;
mod mount;
mod record;
mod state;

pub use controller::{SurfaceRequest, ViewController};
pub use engine::ListViewEngine;
pub use mount::ViewMount;
pub use record::{FieldValue, JsonRecord, Record};
pub use state::{PageView, SortDirection, SortSpec, ViewState};
