use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::BlockError;
use crate::operation::Block;
use crate::operations;
use crate::schema::OperationDescriptor;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::builtin);

pub struct Registry {
    blocks: Vec<Box<dyn Block>>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Every operation this crate ships, in catalog order.
    pub fn builtin() -> Registry {
        let mut registry = Registry::empty();
        operations::register_all(&mut registry);
        registry
    }

    pub fn empty() -> Registry {
        Registry {
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Panics on a duplicate name: the catalog is static, so a clash is a build mistake.
    pub fn register<B>(&mut self, block: B)
    where
        B: Block + 'static,
    {
        let name = block.descriptor().name;
        if self.index.insert(name, self.blocks.len()).is_some() {
            panic!("operation {} is registered twice", name);
        }
        self.blocks.push(Box::new(block));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Block, BlockError> {
        self.index
            .get(name)
            .map(|&position| self.blocks[position].as_ref())
            .ok_or_else(|| BlockError::UnknownOperation(name.to_string()))
    }

    pub fn descriptors(&self) -> Vec<OperationDescriptor> {
        self.blocks.iter().map(|block| block.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}
