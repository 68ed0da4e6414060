//! Core graph data structures and the mutation session

mod key;
mod node;
mod session;


pub use key::NodeKey;
pub use node::{category, Node, NodeInput, PERSON_ROOT};
pub use session::{GraphError, GraphResult, GraphSession};
