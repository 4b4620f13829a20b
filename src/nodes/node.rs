//! Node types and core node functionality

use super::port::{InputSlot, OutputSlot};
use crate::constants::layout;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a node
pub type NodeId = usize;

/// A configuration widget on a node (text field, combo, button, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl Widget {
    /// Creates a new widget with the given current value
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Core node structure as seen by the hub engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Registered class of the node, e.g. `PipeHub` or `Reroute`
    pub class_type: String,
    pub title: String,
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default = "default_size")]
    pub size: [f32; 2],
    /// Set whenever the node needs to be redrawn
    #[serde(skip)]
    pub dirty: bool,
}

fn default_size() -> [f32; 2] {
    [layout::NODE_WIDTH, layout::TITLE_HEIGHT]
}

impl Node {
    /// Creates a new node of the given class; the title defaults to the class
    pub fn new(class_type: impl Into<String>) -> Self {
        let class_type = class_type.into();
        Self {
            id: 0,
            title: class_type.clone(),
            class_type,
            inputs: vec![],
            outputs: vec![],
            widgets: vec![],
            size: default_size(),
            dirty: false,
        }
    }

    /// Adds an input slot to the node
    pub fn add_input(&mut self, name: impl Into<String>, slot_type: impl Into<String>) -> &mut Self {
        self.inputs.push(InputSlot::new(name, slot_type));
        self
    }

    /// Adds an output slot to the node
    pub fn add_output(&mut self, name: impl Into<String>, slot_type: impl Into<String>) -> &mut Self {
        self.outputs.push(OutputSlot::new(name, slot_type));
        self
    }

    /// Adds a configuration widget to the node
    pub fn add_widget(&mut self, widget: Widget) -> &mut Self {
        self.widgets.push(widget);
        self
    }

    /// Sets the title of the node
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Index of the first input with the given name
    pub fn find_input(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|slot| slot.name == name)
    }

    /// Index of the first output with the given name
    pub fn find_output(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|slot| slot.name == name)
    }

    /// Link arriving at the input with the given index, if any
    pub fn input_link(&self, index: usize) -> Option<super::port::LinkId> {
        self.inputs.get(index).and_then(|slot| slot.link)
    }

    /// Size that fits every slot row and widget row
    pub fn compute_size(&self) -> [f32; 2] {
        let rows = self.inputs.len().max(self.outputs.len()) as f32;
        let height = layout::TITLE_HEIGHT
            + rows * layout::SLOT_HEIGHT
            + self.widgets.len() as f32 * layout::WIDGET_HEIGHT;
        [self.size[0].max(layout::NODE_WIDTH), height]
    }
}
