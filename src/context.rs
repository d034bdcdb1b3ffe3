//! Everything a population call is configured with: settings, per-selector
//! generators, assignment rules, ignore/nullable selectors, plugins,
//! constraint providers and post-processors.
use crate::assignment::{Assignment, AssignmentId, AssignmentRule};
use crate::constraint::{self, ConstraintProvider};
use crate::generator::GeneratorSpec;
use crate::node::{Node, NodeId, NodeKind, NodeTree, TargetClass};
use crate::post_process::{PostProcessor, StringPrefixPostProcessor};
use crate::resolver::{self, GeneratorProvider, GeneratorResolver};
use crate::selector::Selector;
use crate::settings::Settings;

pub struct ModelContext {
    pub settings: Settings,
    generators: Vec<(Selector, GeneratorSpec)>,
    assignments: Vec<Assignment>,
    ignored: Vec<Selector>,
    nullable: Vec<Selector>,
    plugins: Vec<Box<dyn GeneratorProvider>>,
    constraint_providers: Vec<Box<dyn ConstraintProvider>>,
    post_processors: Vec<Box<dyn PostProcessor>>,
    builtins: GeneratorResolver,
}

impl ModelContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            generators: Vec::new(),
            assignments: Vec::new(),
            ignored: Vec::new(),
            nullable: Vec::new(),
            plugins: Vec::new(),
            constraint_providers: constraint::default_providers(),
            post_processors: vec![Box::new(StringPrefixPostProcessor)],
            builtins: GeneratorResolver::new(),
        }
    }

    // ---------------------------- builders -------------------------------- //

    /// Use `spec` for nodes matching `selector`. Later registrations win.
    pub fn generator(mut self, selector: Selector, spec: GeneratorSpec) -> Self {
        self.generators.push((selector, spec));
        self
    }

    pub fn assign(mut self, rule: AssignmentRule) -> Self {
        let id = AssignmentId::new(self.assignments.len());
        self.assignments.push(Assignment { id, rule });
        self
    }

    pub fn ignore(mut self, selector: Selector) -> Self {
        self.ignored.push(selector);
        self
    }

    pub fn with_nullable(mut self, selector: Selector) -> Self {
        self.nullable.push(selector);
        self
    }

    pub fn plugin(mut self, provider: Box<dyn GeneratorProvider>) -> Self {
        self.plugins.push(provider);
        self
    }

    pub fn constraint_provider(mut self, provider: Box<dyn ConstraintProvider>) -> Self {
        self.constraint_providers.push(provider);
        self
    }

    pub fn post_processor(mut self, processor: Box<dyn PostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    // ---------------------------- queries --------------------------------- //

    /// Flag every node matched by an ignore selector.
    pub fn apply_ignores(&self, tree: &mut NodeTree) {
        let ignored = &self.ignored;
        tree.mark_ignored(|t, n| ignored.iter().any(|s| s.matches(t, n)));
    }

    pub fn generator_for(&self, tree: &NodeTree, node: &Node) -> Option<&GeneratorSpec> {
        self.generators
            .iter()
            .rev()
            .find(|(s, _)| s.matches(tree, node))
            .map(|(_, spec)| spec)
    }

    /// Rules whose destination matches `node`, in declaration order.
    pub fn assignments_for(&self, tree: &NodeTree, node: &Node) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.rule.destination.matches(tree, node))
            .collect()
    }

    /// Distinct origin selectors that `node` supplies a value for.
    pub fn origins_matching(&self, tree: &NodeTree, node: &Node) -> Vec<&Selector> {
        let mut out: Vec<&Selector> = Vec::new();
        for a in &self.assignments {
            if let Some(origin) = &a.rule.origin {
                if origin.matches(tree, node) && !out.contains(&origin) {
                    out.push(origin);
                }
            }
        }
        out
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Whether a generator or assignment explicitly targets `node`.
    pub fn has_selector_for(&self, tree: &NodeTree, node: &Node) -> bool {
        self.generator_for(tree, node).is_some() || !self.assignments_for(tree, node).is_empty()
    }

    /// Weight of the null coin flip for `node`: zero for the root and for
    /// `not_null` nodes.
    pub fn null_probability(&self, tree: &NodeTree, node: &Node) -> f64 {
        if node.is_root() || constraint::has_not_null(node) {
            return 0.0;
        }
        let explicit = self.nullable.iter().any(|s| s.matches(tree, node));
        let by_field = self.settings.nullable_fields && node.field.is_some();
        let by_element = self.settings.nullable_elements
            && node.field.is_none()
            && tree
                .parent(node.id)
                .is_some_and(|p| matches!(p.kind, NodeKind::Collection | NodeKind::Array));
        if explicit || by_field || by_element {
            self.settings.null_probability
        } else {
            0.0
        }
    }

    pub fn plugin_generator(&self, target: &TargetClass) -> Option<GeneratorSpec> {
        resolver::plugin_generator(&self.plugins, target, &self.settings)
    }

    pub fn builtin_generator(&self, target: &TargetClass) -> Option<GeneratorSpec> {
        self.builtins.builtin(target, &self.settings)
    }

    pub fn builtins(&self) -> &GeneratorResolver {
        &self.builtins
    }

    pub fn constraint_providers(&self) -> &[Box<dyn ConstraintProvider>] {
        &self.constraint_providers
    }

    pub fn post_processors(&self) -> &[Box<dyn PostProcessor>] {
        &self.post_processors
    }

    pub fn is_ignored(&self, tree: &NodeTree, id: NodeId) -> bool {
        tree.node(id).ignored
    }
}
