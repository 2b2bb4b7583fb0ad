//! Links mixins to the analyzed classes that directly extend them.

use tracing::trace;

use super::Analysis;
use crate::model::ObjectKind;

impl<'a> Analysis<'a> {
    /// Record every known class whose direct supertypes include a mixin as
    /// one of that mixin's implementers. Safe to run repeatedly.
    pub(crate) fn link_implementations(&mut self) {
        let classes: Vec<(String, Vec<String>)> = self
            .structs
            .values()
            .filter(|s| s.kind == ObjectKind::Class)
            .filter_map(|s| {
                let symbol = self.lookup(&s.type_name)?;
                Some((s.type_name.clone(), symbol.supertypes.clone()))
            })
            .collect();

        for mixin in self.structs.values_mut().filter(|s| s.kind == ObjectKind::Mixin) {
            for (class, supertypes) in &classes {
                if supertypes.contains(&mixin.type_name) && mixin.implementers.insert(class.clone()) {
                    trace!(mixin = %mixin.type_name, implementer = %class, "implementation linked");
                }
            }
        }
    }
}
