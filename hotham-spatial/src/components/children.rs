use hecs::Entity;

/// The hierarchy capability: an ordered list of an entity's children.
///
/// Children are updated in the order they were added. Use [`crate::hierarchy::add_child`] and
/// [`crate::hierarchy::remove_child`] to keep this list and the children's [`super::Parent`]
/// components in agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(Vec<Entity>);

impl Children {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    pub(crate) fn push(&mut self, entity: Entity) {
        if !self.contains(entity) {
            self.0.push(entity);
        }
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> bool {
        let before = self.0.len();
        self.0.retain(|e| *e != entity);
        self.0.len() != before
    }
}

impl FromIterator<Entity> for Children {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut children = Children::new();
        for entity in iter {
            children.push(entity);
        }
        children
    }
}
