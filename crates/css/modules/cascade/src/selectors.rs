//! Selector subset used to decide which rules match an inspected element.
//! Reference: <https://www.w3.org/TR/selectors-4/>

use core::mem::take;

/// Specificity triple (a, b, c).
/// §17: Calculating a selector's specificity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    fn add(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
        self.1 = self.1.saturating_add(other.1);
        self.2 = self.2.saturating_add(other.2);
    }
}

/// What a selector needs to know about an element.
pub trait ElementView {
    /// Lowercased tag name.
    fn tag_name(&self) -> &str;
    /// The `id` attribute, if any.
    fn element_id(&self) -> Option<&str>;
    /// Whether the class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Simple {
    Type(String),
    Class(String),
    Id(String),
    Universal,
    /// Pseudo-classes are counted for specificity but never match a static snapshot.
    PseudoClass(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    simples: Vec<Simple>,
}

impl Compound {
    fn specificity(&self) -> Specificity {
        let mut total = Specificity::default();
        for simple in &self.simples {
            match simple {
                Simple::Id(_) => total.0 = total.0.saturating_add(1),
                Simple::Class(_) | Simple::PseudoClass(_) => total.1 = total.1.saturating_add(1),
                Simple::Type(_) => total.2 = total.2.saturating_add(1),
                Simple::Universal => {}
            }
        }
        total
    }

    fn matches<E: ElementView>(&self, element: &E) -> bool {
        self.simples.iter().all(|simple| match simple {
            Simple::Universal => true,
            Simple::Type(name) => element.tag_name() == name,
            Simple::Class(class) => element.has_class(class),
            Simple::Id(id) => element.element_id() == Some(id.as_str()),
            Simple::PseudoClass(_) => false,
        })
    }
}

/// One complex selector, compounds stored right-to-left.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexSelector {
    /// Subject compound first; each entry records how it relates to the next one leftwards.
    compounds: Vec<(Compound, Option<Combinator>)>,
    /// Target pseudo-element (`before` for `::before`), if any.
    pseudo_element: Option<String>,
}

impl ComplexSelector {
    /// Specificity of the selector.
    pub fn specificity(&self) -> Specificity {
        let mut total = Specificity::default();
        for (compound, _) in &self.compounds {
            total.add(compound.specificity());
        }
        if self.pseudo_element.is_some() {
            total.2 = total.2.saturating_add(1);
        }
        total
    }

    /// Target pseudo-element name.
    pub fn pseudo_element(&self) -> Option<&str> {
        self.pseudo_element.as_deref()
    }

    /// Match against an element given as its ancestor chain, subject first.
    pub fn matches<E: ElementView>(&self, chain: &[E]) -> bool {
        let Some((first, rest)) = self.compounds.split_first() else {
            return false;
        };
        let (subject, first_relation) = first;
        let mut relation = *first_relation;
        let Some((element, mut ancestors)) = chain.split_first() else {
            return false;
        };
        if !subject.matches(element) {
            return false;
        }
        for (compound, next_relation) in rest {
            let Some(combinator) = relation else {
                return false;
            };
            match combinator {
                Combinator::Child => {
                    let Some((parent, above)) = ancestors.split_first() else {
                        return false;
                    };
                    if !compound.matches(parent) {
                        return false;
                    }
                    ancestors = above;
                }
                Combinator::Descendant => {
                    let Some(position) = ancestors.iter().position(|candidate| compound.matches(candidate)) else {
                        return false;
                    };
                    ancestors = ancestors.get(position.saturating_add(1)..).unwrap_or_default();
                }
            }
            relation = *next_relation;
        }
        true
    }
}

/// A comma-separated selector list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
    /// Selectors in source order.
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Indices of the selectors that match `chain` for the given pseudo-element.
    pub fn matching_indices<E: ElementView>(&self, chain: &[E], pseudo: Option<&str>) -> Vec<usize> {
        self.selectors
            .iter()
            .enumerate()
            .filter(|(_, selector)| selector.pseudo_element() == pseudo && selector.matches(chain))
            .map(|(index, _)| index)
            .collect()
    }

    /// Highest specificity among the matching selectors.
    pub fn matching_specificity<E: ElementView>(&self, chain: &[E], pseudo: Option<&str>) -> Option<Specificity> {
        self.matching_indices(chain, pseudo)
            .into_iter()
            .filter_map(|index| self.selectors.get(index))
            .map(ComplexSelector::specificity)
            .max()
    }
}

fn consume_ident(bytes: &[u8], index: &mut usize) -> String {
    let start = *index;
    while let Some(&byte) = bytes.get(*index) {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            *index = index.saturating_add(1);
        } else {
            break;
        }
    }
    String::from_utf8_lossy(bytes.get(start..*index).unwrap_or_default()).into_owned()
}

/// Parse one complex selector. Unsupported syntax yields `None`.
fn parse_complex(text: &str) -> Option<ComplexSelector> {
    let bytes = text.trim().as_bytes();
    let mut index = 0;
    let mut compounds: Vec<(Compound, Option<Combinator>)> = Vec::new();
    let mut current = Compound::default();
    let mut pending: Option<Combinator> = None;
    let mut pseudo_element = None;
    while let Some(&byte) = bytes.get(index) {
        match byte {
            b' ' | b'\t' | b'\n' => {
                index = index.saturating_add(1);
                if !current.simples.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
            }
            b'>' => {
                index = index.saturating_add(1);
                pending = Some(Combinator::Child);
            }
            b'*' | b'.' | b'#' | b':' | b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'-' => {
                if let Some(combinator) = pending.take() {
                    if current.simples.is_empty() {
                        return None;
                    }
                    compounds.push((take(&mut current), Some(combinator)));
                }
                if pseudo_element.is_some() {
                    return None;
                }
                match byte {
                    b'*' => {
                        index = index.saturating_add(1);
                        current.simples.push(Simple::Universal);
                    }
                    b'.' => {
                        index = index.saturating_add(1);
                        current.simples.push(Simple::Class(consume_ident(bytes, &mut index)));
                    }
                    b'#' => {
                        index = index.saturating_add(1);
                        current.simples.push(Simple::Id(consume_ident(bytes, &mut index)));
                    }
                    b':' => {
                        index = index.saturating_add(1);
                        let double = bytes.get(index) == Some(&b':');
                        if double {
                            index = index.saturating_add(1);
                        }
                        let name = consume_ident(bytes, &mut index).to_ascii_lowercase();
                        let legacy = matches!(name.as_str(), "before" | "after" | "first-line" | "first-letter");
                        if double || legacy {
                            if current.simples.is_empty() {
                                current.simples.push(Simple::Universal);
                            }
                            pseudo_element = Some(name);
                        } else {
                            current.simples.push(Simple::PseudoClass(name));
                        }
                    }
                    _ => {
                        current.simples.push(Simple::Type(consume_ident(bytes, &mut index).to_ascii_lowercase()));
                    }
                }
            }
            _ => return None,
        }
    }
    if current.simples.is_empty() {
        return None;
    }
    compounds.push((current, None));
    // Stored subject-first, each compound carrying the combinator to its left neighbour.
    let mut subject_first = Vec::with_capacity(compounds.len());
    let mut iter = compounds.into_iter().rev().peekable();
    while let Some((compound, _)) = iter.next() {
        let relation = iter.peek().and_then(|(_, combinator)| *combinator);
        subject_first.push((compound, relation));
    }
    Some(ComplexSelector {
        compounds: subject_first,
        pseudo_element,
    })
}

/// Parse a selector list; selectors outside the supported subset are dropped.
/// §5: Selector lists
pub fn parse_selector_list(text: &str) -> SelectorList {
    SelectorList {
        selectors: text.split(',').filter_map(parse_complex).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Element {
        tag: &'static str,
        id: Option<&'static str>,
        classes: &'static [&'static str],
    }

    impl ElementView for Element {
        fn tag_name(&self) -> &str {
            self.tag
        }
        fn element_id(&self) -> Option<&str> {
            self.id
        }
        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
    }

    fn chain() -> Vec<Element> {
        vec![
            Element { tag: "span", id: Some("target"), classes: &["note"] },
            Element { tag: "p", id: None, classes: &[] },
            Element { tag: "div", id: None, classes: &["box"] },
        ]
    }

    #[test]
    fn matches_combinators_and_lists() {
        let list = parse_selector_list("div > span, .box span.note, p > span#target");
        assert_eq!(list.matching_indices(&chain(), None), vec![1, 2]);
        assert_eq!(list.matching_specificity(&chain(), None), Some(Specificity(1, 0, 2)));
    }

    #[test]
    fn pseudo_elements_are_targets() {
        let list = parse_selector_list("span::before, span:hover");
        assert_eq!(list.matching_indices(&chain(), Some("before")), vec![0]);
        assert!(list.matching_indices(&chain(), None).is_empty());
    }
}
