//! Scoped record of produced values, keyed by origin selector.
use std::collections::HashMap;

use crate::error::FixtureError;
use crate::result::GeneratorResult;
use crate::selector::Selector;

/// Opaque handle returned by [`AssignmentObjectStore::enter_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle(u64);

#[derive(Debug)]
struct Scope {
    handle: ScopeHandle,
    values: HashMap<Selector, GeneratorResult>,
}

#[derive(Debug, Default)]
pub struct AssignmentObjectStore {
    scopes: Vec<Scope>,
    next_handle: u64,
}

impl AssignmentObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) -> ScopeHandle {
        let handle = ScopeHandle(self.next_handle);
        self.next_handle += 1;
        self.scopes.push(Scope { handle, values: HashMap::new() });
        handle
    }

    /// Pops the innermost scope, which must be the one `handle` names.
    pub fn exit_scope(&mut self, handle: ScopeHandle) -> Result<(), FixtureError> {
        match self.scopes.last() {
            Some(scope) if scope.handle == handle => {
                self.scopes.pop();
                Ok(())
            }
            Some(scope) => Err(FixtureError::internal(format!(
                "scope {:?} exited while {:?} is innermost",
                handle, scope.handle
            ))),
            None => Err(FixtureError::internal(format!("scope {handle:?} exited with no open scope"))),
        }
    }

    /// Record into the innermost scope.
    pub fn put(&mut self, selector: Selector, result: GeneratorResult) -> Result<(), FixtureError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| FixtureError::internal(format!("value for [{selector}] recorded outside any scope")))?;
        scope.values.insert(selector, result);
        Ok(())
    }

    /// Innermost-to-outermost lookup.
    pub fn get(&self, selector: &Selector) -> Option<&GeneratorResult> {
        self.scopes.iter().rev().find_map(|s| s.values.get(selector))
    }
}
