//! Funciones registradas en un nodo (punto de extensión del snapshot).

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::errors::Result;

pub type FunctionCall = Rc<dyn Fn(&[Value]) -> Result<Value>>;

#[derive(Clone)]
pub struct NodeFunction {
    pub name: String,
    pub call: FunctionCall,
}

impl fmt::Debug for NodeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFunction").field("name", &self.name).finish_non_exhaustive()
    }
}
