use crate::dom::document::{Document, NodeId};
use crate::dom::selector::{
    parse_selector, AttrCondition, Combinator, ComplexSelector, Compound, Pseudo, SelectorError,
    SelectorList,
};

/// Selector queries with `querySelectorAll` semantics: selectors match
/// against the whole document, results are the matching descendants of the
/// query root in document order.
impl Document {
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        self.query_selector_all_from(self.root(), selector)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        self.query_selector_from(self.root(), selector)
    }

    pub fn query_selector_all_from(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self.select_from(scope, &list))
    }

    pub fn query_selector_from(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|&node| self.matches_list(node, &list, scope)))
    }

    /// Evaluate a pre-parsed selector under `scope`.
    pub fn select_from(&self, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&node| self.matches_list(node, list, scope))
            .collect()
    }

    /// Like `Element.matches`; a leading `>` is relative to the document.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self.matches_list(node, &list, self.root()))
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        let mut cursor = Some(node).filter(|&n| self.is_element(n));
        while let Some(current) = cursor {
            if self.matches_list(current, &list, self.root()) {
                return Ok(Some(current));
            }
            cursor = self.parent_element(current);
        }
        Ok(None)
    }

    pub(crate) fn matches_list(&self, node: NodeId, list: &SelectorList, scope: NodeId) -> bool {
        list.0
            .iter()
            .any(|complex| self.matches_complex(node, complex, scope))
    }

    fn matches_complex(&self, node: NodeId, complex: &ComplexSelector, scope: NodeId) -> bool {
        match complex.parts.len() {
            0 => false,
            len => self.match_part(node, complex, len - 1, scope),
        }
    }

    /// Right-to-left match with backtracking over descendant combinators.
    fn match_part(&self, node: NodeId, complex: &ComplexSelector, idx: usize, scope: NodeId) -> bool {
        let part = &complex.parts[idx];
        if !self.matches_compound(node, &part.compound) {
            return false;
        }
        if idx == 0 {
            return !complex.scoped || self.parent(node) == Some(scope);
        }

        match part.combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => self
                .parent_element(node)
                .is_some_and(|parent| self.match_part(parent, complex, idx - 1, scope)),
            Combinator::Descendant => {
                let mut cursor = self.parent_element(node);
                while let Some(ancestor) = cursor {
                    if self.match_part(ancestor, complex, idx - 1, scope) {
                        return true;
                    }
                    cursor = self.parent_element(ancestor);
                }
                false
            }
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };

        if let Some(tag) = &compound.tag {
            if element.tag != *tag {
                return false;
            }
        }

        if let Some(id) = &compound.id {
            if self.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }

        if !compound.classes.iter().all(|class| self.has_class(node, class)) {
            return false;
        }

        let attrs_match = compound.attrs.iter().all(|condition| match condition {
            AttrCondition::Exists(name) => self.has_attr(node, name),
            AttrCondition::Equals(name, value) => self.attr(node, name) == Some(value.as_str()),
        });
        if !attrs_match {
            return false;
        }

        compound.pseudos.iter().all(|pseudo| match pseudo {
            Pseudo::Not(inner) => !self.matches_list(node, inner, self.root()),
            Pseudo::NthChild(n) => self.element_index(node) == Some(*n),
        })
    }
}
